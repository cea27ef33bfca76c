use sparrow_algebra::{
    AggregateExpression, AggregateFunction, Expression, Function, GraphPattern, OrderExpression,
    Query, TriplePattern,
};
use sparrow_engine::{MemoryTriplesSource, QueryResults, World};
use sparrow_model::{Dataset, GraphName, Literal, NamedNode, Quad, Term, Variable};
use sparrow_results::{ParsedQueryResults, QueryResultsFormat, ResultsParser};
use std::rc::Rc;

fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(value)
}

fn lit(value: &str) -> Term {
    Literal::new_simple_literal(value).into()
}

fn int(value: i64) -> Term {
    Literal::from(value).into()
}

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

fn values(variables: &[&str], rows: &[Vec<Option<Term>>]) -> GraphPattern {
    GraphPattern::Values {
        variables: variables.iter().map(|name| var(name)).collect(),
        bindings: rows.to_vec(),
    }
}

fn select(pattern: GraphPattern) -> Query {
    Query::Select {
        pattern,
        base_iri: None,
    }
}

fn exec(query: &Query, dataset: Dataset) -> QueryResults {
    let world = Rc::new(World::new());
    QueryResults::new(&world, query, MemoryTriplesSource::new(dataset)).unwrap()
}

fn all_rows(results: &mut QueryResults) -> Vec<Vec<Option<Term>>> {
    let mut rows = Vec::new();
    while results.next().unwrap() {
        rows.push(
            (0..results.get_bindings_count())
                .map(|index| results.get_binding_value(index))
                .collect(),
        );
    }
    rows
}

#[test]
fn basic_compatible_join() {
    let pattern = GraphPattern::Join {
        left: Box::new(values(
            &["a", "b"],
            &[vec![Some(lit("v1")), Some(lit("v2"))]],
        )),
        right: Box::new(values(
            &["a", "b"],
            &[vec![Some(lit("v1")), Some(lit("v2"))]],
        )),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![vec![Some(lit("v1")), Some(lit("v2"))]]
    );
    assert!(results.finished_ok());
}

#[test]
fn incompatible_join_yields_nothing() {
    let pattern = GraphPattern::Join {
        left: Box::new(values(&["a"], &[vec![Some(lit("v1"))]])),
        right: Box::new(values(&["a"], &[vec![Some(lit("v2"))]])),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert!(all_rows(&mut results).is_empty());
}

#[test]
fn vacuous_compatibility_joins_but_does_not_minus() {
    let join = GraphPattern::Join {
        left: Box::new(values(&["a"], &[vec![Some(lit("v1"))]])),
        right: Box::new(values(&["b"], &[vec![Some(lit("v2"))]])),
    };
    let mut results = exec(&select(join), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![vec![Some(lit("v1")), Some(lit("v2"))]]
    );

    let minus = GraphPattern::Minus {
        left: Box::new(values(&["a"], &[vec![Some(lit("v1"))]])),
        right: Box::new(values(&["b"], &[vec![Some(lit("v2"))]])),
    };
    let mut results = exec(&select(minus), Dataset::new());
    // No shared bound variable: the left row survives
    assert_eq!(all_rows(&mut results), vec![vec![Some(lit("v1"))]]);
}

#[test]
fn minus_removes_on_shared_agreement() {
    let minus = GraphPattern::Minus {
        left: Box::new(values(
            &["a"],
            &[vec![Some(lit("v1"))], vec![Some(lit("v2"))]],
        )),
        right: Box::new(values(&["a"], &[vec![Some(lit("v1"))]])),
    };
    let mut results = exec(&select(minus), Dataset::new());
    assert_eq!(all_rows(&mut results), vec![vec![Some(lit("v2"))]]);
}

#[test]
fn optional_falls_back_to_the_left_row() {
    let pattern = GraphPattern::LeftJoin {
        left: Box::new(values(&["a"], &[vec![Some(lit("v1"))]])),
        right: Box::new(values(&["b"], &[])),
        expression: None,
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(all_rows(&mut results), vec![vec![Some(lit("v1")), None]]);
}

#[test]
fn left_join_filter_error_is_false() {
    // ?b > 5 errors on a string binding: the merged row is rejected and the
    // left row falls through unchanged
    let pattern = GraphPattern::LeftJoin {
        left: Box::new(values(&["a"], &[vec![Some(lit("v1"))]])),
        right: Box::new(values(&["b"], &[vec![Some(lit("abc"))]])),
        expression: Some(Expression::Greater(
            Box::new(Expression::variable("b")),
            Box::new(Expression::Literal(Literal::from(5i64))),
        )),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(all_rows(&mut results), vec![vec![Some(lit("v1")), None]]);
}

#[test]
fn filter_drops_error_rows_without_failing() {
    let pattern = GraphPattern::Filter {
        expression: Expression::Greater(
            Box::new(Expression::variable("x")),
            Box::new(Expression::Literal(Literal::from(5i64))),
        ),
        inner: Box::new(values(
            &["x"],
            &[
                vec![Some(lit("abc"))],
                vec![Some(int(7))],
                vec![Some(int(3))],
            ],
        )),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(all_rows(&mut results), vec![vec![Some(int(7))]]);
    assert!(results.finished_ok());
}

#[test]
fn extend_binds_coalesce_fallback() {
    // COALESCE(?x, ?y + "abc", "fallback") with ?y = 3: the first argument
    // is unbound and the second errors
    let pattern = GraphPattern::Extend {
        inner: Box::new(values(&["y"], &[vec![Some(int(3))]])),
        variable: var("z"),
        expression: Expression::Coalesce(vec![
            Expression::variable("x"),
            Expression::Add(
                Box::new(Expression::variable("y")),
                Box::new(Expression::Literal(Literal::new_simple_literal("abc"))),
            ),
            Expression::Literal(Literal::new_simple_literal("fallback")),
        ]),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![vec![Some(int(3)), Some(lit("fallback"))]]
    );
}

#[test]
fn projection_of_an_absent_variable_is_unbound() {
    let pattern = GraphPattern::Project {
        inner: Box::new(values(&["a"], &[vec![Some(lit("v1"))]])),
        variables: vec![var("a"), var("b")],
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(results.get_bindings_count(), 2);
    assert_eq!(results.get_binding_name(1), Some(&var("b")));
    assert_eq!(all_rows(&mut results), vec![vec![Some(lit("v1")), None]]);
}

#[test]
fn distinct_keeps_the_first_occurrence() {
    let rows = [
        vec![Some(int(1)), Some(int(1))],
        vec![Some(int(1)), Some(int(2))],
        vec![Some(int(1)), Some(int(1))],
        vec![Some(int(1)), Some(int(3))],
    ];
    let pattern = GraphPattern::Distinct {
        inner: Box::new(values(&["x", "y"], &rows)),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![
            vec![Some(int(1)), Some(int(1))],
            vec![Some(int(1)), Some(int(2))],
            vec![Some(int(1)), Some(int(3))],
        ]
    );
}

#[test]
fn reduced_only_suppresses_adjacent_duplicates() {
    let rows = [
        vec![Some(int(1))],
        vec![Some(int(1))],
        vec![Some(int(2))],
        vec![Some(int(1))],
    ];
    let pattern = GraphPattern::Reduced {
        inner: Box::new(values(&["x"], &rows)),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![vec![Some(int(1))], vec![Some(int(2))], vec![Some(int(1))]]
    );
}

#[test]
fn union_is_left_then_right_with_widening() {
    let pattern = GraphPattern::Union {
        left: Box::new(values(&["a"], &[vec![Some(lit("l"))]])),
        right: Box::new(values(&["b"], &[vec![Some(lit("r"))]])),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![
            vec![Some(lit("l")), None],
            vec![None, Some(lit("r"))],
        ]
    );
}

#[test]
fn order_by_is_stable_and_honours_direction() {
    let rows = [
        vec![Some(int(2)), Some(lit("first"))],
        vec![Some(int(1)), Some(lit("a"))],
        vec![Some(int(2)), Some(lit("second"))],
    ];
    let pattern = GraphPattern::OrderBy {
        inner: Box::new(values(&["k", "v"], &rows)),
        conditions: vec![OrderExpression::Desc(Expression::variable("k"))],
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![
            vec![Some(int(2)), Some(lit("first"))],
            vec![Some(int(2)), Some(lit("second"))],
            vec![Some(int(1)), Some(lit("a"))],
        ]
    );
}

#[test]
fn order_by_sorts_errors_first() {
    let rows = [
        vec![Some(int(5))],
        vec![None],
        vec![Some(int(2))],
    ];
    let pattern = GraphPattern::OrderBy {
        inner: Box::new(values(&["x"], &rows)),
        conditions: vec![OrderExpression::Asc(Expression::variable("x"))],
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![vec![None], vec![Some(int(2))], vec![Some(int(5))]]
    );
}

#[test]
fn slice_skips_and_limits() {
    let rows = [
        vec![Some(int(1))],
        vec![Some(int(2))],
        vec![Some(int(3))],
        vec![Some(int(4))],
    ];
    let pattern = GraphPattern::Slice {
        inner: Box::new(values(&["x"], &rows)),
        offset: 1,
        limit: Some(2),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![vec![Some(int(2))], vec![Some(int(3))]]
    );
}

#[test]
fn bgp_scan_binds_declared_variables() {
    let mut dataset = Dataset::new();
    dataset.insert(Quad::new(
        iri("http://example.com/alice"),
        iri("http://example.com/knows"),
        iri("http://example.com/bob"),
        GraphName::DefaultGraph,
    ));
    dataset.insert(Quad::new(
        iri("http://example.com/bob"),
        iri("http://example.com/name"),
        Literal::new_simple_literal("Bob"),
        GraphName::DefaultGraph,
    ));
    // ?who <knows> ?other . ?other <name> ?name
    let pattern = GraphPattern::Bgp {
        patterns: vec![
            TriplePattern::new(var("who"), iri("http://example.com/knows"), var("other")),
            TriplePattern::new(var("other"), iri("http://example.com/name"), var("name")),
        ],
    };
    let mut results = exec(&select(pattern), dataset);
    assert_eq!(
        all_rows(&mut results),
        vec![vec![
            Some(iri("http://example.com/alice").into()),
            Some(iri("http://example.com/bob").into()),
            Some(lit("Bob")),
        ]]
    );
}

#[test]
fn graph_operator_enumerates_named_graphs() {
    let mut dataset = Dataset::new();
    dataset.insert(Quad::new(
        iri("http://example.com/s"),
        iri("http://example.com/p"),
        lit("in-g1"),
        iri("http://example.com/g1"),
    ));
    dataset.insert(Quad::new(
        iri("http://example.com/s"),
        iri("http://example.com/p"),
        lit("in-g2"),
        iri("http://example.com/g2"),
    ));
    dataset.insert(Quad::new(
        iri("http://example.com/s"),
        iri("http://example.com/p"),
        lit("in-default"),
        GraphName::DefaultGraph,
    ));
    let pattern = GraphPattern::Graph {
        name: var("g").into(),
        inner: Box::new(GraphPattern::Bgp {
            patterns: vec![TriplePattern::new(
                var("s"),
                iri("http://example.com/p"),
                var("o"),
            )],
        }),
    };
    let mut results = exec(&select(pattern), dataset);
    let rows = all_rows(&mut results);
    assert_eq!(rows.len(), 2);
    // Each row carries its graph in ?g and never the default-graph triple
    let graphs: Vec<Option<Term>> = rows.iter().map(|row| row[2].clone()).collect();
    assert_eq!(
        graphs,
        vec![
            Some(iri("http://example.com/g1").into()),
            Some(iri("http://example.com/g2").into()),
        ]
    );
    assert!(rows
        .iter()
        .all(|row| row[1] != Some(lit("in-default"))));
}

#[test]
fn group_aggregates_count_sum_and_concat() {
    let rows = [
        vec![Some(lit("a")), Some(int(1))],
        vec![Some(lit("a")), Some(int(2))],
        vec![Some(lit("b")), Some(int(5))],
    ];
    let pattern = GraphPattern::Group {
        inner: Box::new(values(&["k", "v"], &rows)),
        by: vec![Expression::variable("k")],
        aggregates: vec![
            (
                var("n"),
                AggregateExpression::count_all(),
            ),
            (
                var("total"),
                AggregateExpression::new(AggregateFunction::Sum, Expression::variable("v")),
            ),
            (
                var("joined"),
                AggregateExpression {
                    function: AggregateFunction::GroupConcat,
                    expression: Some(Expression::variable("v")),
                    distinct: false,
                    separator: Some(",".to_owned()),
                },
            ),
        ],
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(
        all_rows(&mut results),
        vec![
            vec![
                Some(lit("a")),
                Some(int(2)),
                Some(int(3)),
                Some(lit("1,2")),
            ],
            vec![
                Some(lit("b")),
                Some(int(1)),
                Some(int(5)),
                Some(lit("5")),
            ],
        ]
    );
}

#[test]
fn ask_is_true_iff_any_row() {
    let query = Query::Ask {
        pattern: values(&["x"], &[vec![Some(int(1))]]),
        base_iri: None,
    };
    let mut results = exec(&query, Dataset::new());
    assert!(results.is_boolean());
    assert!(results.get_boolean().unwrap());

    let query = Query::Ask {
        pattern: values(&["x"], &[]),
        base_iri: None,
    };
    let mut results = exec(&query, Dataset::new());
    assert!(!results.get_boolean().unwrap());
}

#[test]
fn construct_prefixes_template_blanks_per_row() {
    use sparrow_model::BlankNode;
    let query = Query::Construct {
        template: vec![TriplePattern::new(
            BlankNode::new_unchecked("node"),
            iri("http://example.com/value"),
            var("x"),
        )],
        pattern: values(&["x"], &[vec![Some(int(1))], vec![Some(int(2))]]),
        base_iri: None,
    };
    let mut results = exec(&query, Dataset::new());
    assert!(results.is_graph());
    let mut subjects = Vec::new();
    while results.next_triple().unwrap() {
        let triple = results.get_triple().unwrap().clone();
        assert_eq!(triple.predicate, iri("http://example.com/value"));
        subjects.push(triple.subject);
    }
    assert_eq!(subjects.len(), 2);
    // One fresh blank per row per template blank
    assert_ne!(subjects[0], subjects[1]);
}

#[test]
fn construct_skips_ill_formed_triples() {
    let query = Query::Construct {
        // A literal subject can never form a triple
        template: vec![TriplePattern::new(
            var("x"),
            iri("http://example.com/p"),
            var("x"),
        )],
        pattern: values(&["x"], &[vec![Some(lit("a literal"))]]),
        base_iri: None,
    };
    let mut results = exec(&query, Dataset::new());
    assert!(!results.next_triple().unwrap());
}

#[test]
fn filter_with_langmatches() {
    let tagged = |value: &str, tag: &str| -> Term {
        Literal::new_language_tagged_literal(value, tag).unwrap().into()
    };
    let rows = [
        vec![Some(tagged("hello", "en-us"))],
        vec![Some(tagged("bonjour", "fr"))],
    ];
    let pattern = GraphPattern::Filter {
        expression: Expression::FunctionCall(
            Function::LangMatches,
            vec![
                Expression::FunctionCall(Function::Lang, vec![Expression::variable("x")]),
                Expression::Literal(Literal::new_simple_literal("en")),
            ],
        ),
        inner: Box::new(values(&["x"], &rows)),
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert_eq!(all_rows(&mut results), vec![vec![Some(tagged("hello", "en-us"))]]);
}

#[test]
fn failed_execution_is_sticky() {
    let pattern = GraphPattern::Service {
        name: iri("http://remote.example.com/sparql").into(),
        inner: Box::new(values(&["x"], &[])),
        silent: false,
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert!(results.next().is_err());
    assert!(results.finished());
    assert!(!results.finished_ok());
    // After a failure every call returns the no-data sentinel
    assert!(!results.next().unwrap());
    assert_eq!(results.get_binding_value(0), None);
}

#[test]
fn silent_service_degrades_to_one_empty_solution() {
    let pattern = GraphPattern::Service {
        name: iri("http://remote.example.com/sparql").into(),
        inner: Box::new(values(&["x"], &[])),
        silent: true,
    };
    let mut results = exec(&select(pattern), Dataset::new());
    assert!(results.next().unwrap());
    assert!(!results.next().unwrap());
    assert!(results.finished_ok());
}

#[test]
fn finish_is_idempotent() {
    let mut results = exec(
        &select(values(&["x"], &[vec![Some(int(1))]])),
        Dataset::new(),
    );
    results.finish();
    assert!(results.finished());
    results.finish();
    assert!(!results.next().unwrap());
}

#[test]
fn node_count_reports_tree_shape() {
    let pattern = GraphPattern::Distinct {
        inner: Box::new(GraphPattern::Join {
            left: Box::new(values(&["x"], &[])),
            right: Box::new(values(&["x"], &[])),
        }),
    };
    let results = exec(&select(pattern), Dataset::new());
    assert_eq!(results.node_count(), 4);
}

#[test]
fn results_serialize_and_parse_back() {
    let rows = [
        vec![Some(lit("v1")), Some(int(2))],
        vec![Some(lit("v3")), None],
    ];
    let mut results = exec(&select(values(&["a", "b"], &rows)), Dataset::new());
    let buffer = results
        .write_results(Vec::new(), QueryResultsFormat::Json)
        .unwrap();
    match ResultsParser::new(QueryResultsFormat::Json)
        .parse_read(buffer.as_slice())
        .unwrap()
    {
        ParsedQueryResults::Solutions(solutions) => {
            let parsed: Vec<_> = solutions.map(Result::unwrap).collect();
            assert_eq!(parsed.len(), 2);
            assert_eq!(parsed[0].get("a"), Some(&lit("v1")));
            assert_eq!(parsed[0].get("b"), Some(&int(2)));
            assert_eq!(parsed[1].get("a"), Some(&lit("v3")));
            assert_eq!(parsed[1].get("b"), None);
        }
        ParsedQueryResults::Boolean(_) => panic!("expected solutions"),
    }
}

#[test]
fn parsed_solutions_become_a_rowsource_again() {
    use sparrow_engine::{rowsource_from_solutions, RowSource, VariableTable};
    let rows = [vec![Some(lit("v1")), None], vec![None, Some(int(4))]];
    let mut results = exec(&select(values(&["a", "b"], &rows)), Dataset::new());
    let buffer = results
        .write_results(Vec::new(), QueryResultsFormat::Tsv)
        .unwrap();
    let ParsedQueryResults::Solutions(solutions) = ResultsParser::new(QueryResultsFormat::Tsv)
        .parse_read(buffer.as_slice())
        .unwrap()
    else {
        panic!("expected solutions");
    };
    let table = VariableTable::new();
    let mut source = rowsource_from_solutions(&table, solutions.map(Result::unwrap));
    let read_back = source.read_all_rows().unwrap();
    assert_eq!(read_back.len(), 2);
    let a = table.offset("a").unwrap();
    let b = table.offset("b").unwrap();
    assert_eq!(read_back[0].get(a), Some(&lit("v1")));
    assert_eq!(read_back[0].get(b), None);
    assert_eq!(read_back[1].get(b), Some(&int(4)));
}

#[test]
fn boolean_results_serialize_in_every_format() {
    for format in [
        QueryResultsFormat::Xml,
        QueryResultsFormat::Json,
        QueryResultsFormat::Csv,
        QueryResultsFormat::Tsv,
    ] {
        let query = Query::Ask {
            pattern: values(&["x"], &[vec![Some(int(1))]]),
            base_iri: None,
        };
        let mut results = exec(&query, Dataset::new());
        let buffer = results.write_results(Vec::new(), format).unwrap();
        assert!(!buffer.is_empty());
    }
}
