// Base and table library behaviour

use crate::common::{eval_err, eval_one, eval_source, ints, printed, strs};
use coluna::Value;

#[test]
fn test_print_joins_with_tabs() {
    assert_eq!(printed("print(1, 'a', nil, true, 2.5)"), "1\ta\tnil\ttrue\t2.5\n");
    assert_eq!(printed("print()"), "\n");
}

#[test]
fn test_print_inside_coroutine() {
    let out = printed(
        r#"
        local co = coroutine.wrap(function()
            print('in')
            coroutine.yield()
            print('again')
        end)
        co() print('between') co()
        "#,
    );
    assert_eq!(out, "in\nbetween\nagain\n");
}

#[test]
fn test_type_names() {
    let values = eval_source(
        "return type(nil), type(1), type(1.5), type('s'), type({}), type(print), type(coroutine.create(print)), type(false)",
    )
    .unwrap();
    assert_eq!(
        values,
        strs(&["nil", "number", "number", "string", "table", "function", "thread", "boolean"])
    );
}

#[test]
fn test_type_requires_argument() {
    let err = eval_err("type()");
    assert!(err.ends_with("bad argument #1 to 'type' (value expected)"), "{}", err);
}

#[test]
fn test_tostring() {
    let values = eval_source("return tostring(12), tostring(nil), tostring(false), tostring('x')").unwrap();
    assert_eq!(values, strs(&["12", "nil", "false", "x"]));
    let thread = eval_one("return tostring(coroutine.running())");
    assert!(thread.to_string().starts_with("thread: 0x"), "{}", thread);
}

#[test]
fn test_tonumber() {
    let values = eval_source(
        "return tonumber('42'), tonumber(' 0x1F '), tonumber('2.5e1'), tonumber('abc'), tonumber({}), tonumber(7)",
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Int(42),
            Value::Int(31),
            Value::Float(25.0),
            Value::Nil,
            Value::Nil,
            Value::Int(7),
        ]
    );
}

#[test]
fn test_tonumber_with_base() {
    let values = eval_source("return tonumber('ff', 16), tonumber('777', 8), tonumber('zz', 36), tonumber('8', 8)").unwrap();
    assert_eq!(
        values,
        vec![Value::Int(255), Value::Int(511), Value::Int(1295), Value::Nil]
    );
    let err = eval_err("return tonumber('1', 99)");
    assert!(err.ends_with("bad argument #2 to 'tonumber' (base out of range)"), "{}", err);
}

#[test]
fn test_select() {
    let values = eval_source("return select('#', 'a', nil, 'c'), select(2, 'a', 'b', 'c')").unwrap();
    assert_eq!(values, vec![Value::Int(3), Value::string("b"), Value::string("c")]);
    assert_eq!(eval_one("return select(-1, 'a', 'b', 'c')"), Value::string("c"));
    assert_eq!(eval_source("return select(5, 'a')").unwrap(), vec![]);
    let err = eval_err("return select(0, 'a')");
    assert!(err.ends_with("bad argument #1 to 'select' (index out of range)"), "{}", err);
    let err = eval_err("return select(-3, 'a')");
    assert!(err.ends_with("index out of range)"), "{}", err);
}

#[test]
fn test_ipairs_stops_at_first_nil() {
    let values = eval_source(
        r#"
        local sum, count = 0, 0
        for i, v in ipairs({10, 20, nil, 40}) do
            sum = sum + i * v
            count = count + 1
        end
        return sum, count
        "#,
    )
    .unwrap();
    assert_eq!(values, ints(&[50, 2]));
}

#[test]
fn test_pairs_visits_every_entry() {
    let values = eval_source(
        r#"
        local t = {1, 2, 3, a = 10, b = 20}
        local keys, total = 0, 0
        for k, v in pairs(t) do
            keys = keys + 1
            total = total + v
        end
        return keys, total
        "#,
    )
    .unwrap();
    assert_eq!(values, ints(&[5, 36]));
}

#[test]
fn test_pairs_skips_entries_cleared_during_loop() {
    let values = eval_source(
        r#"
        local t = {a = 1, b = 2, c = 3}
        local seen = 0
        for k in pairs(t) do
            seen = seen + 1
            for other in pairs(t) do
                if other ~= k then t[other] = nil end
            end
        end
        return seen
        "#,
    )
    .unwrap();
    assert_eq!(values, ints(&[1]));
}

#[test]
fn test_pairs_requires_table() {
    let err = eval_err("for k in pairs(nil) do end");
    assert!(err.ends_with("bad argument #1 to 'pairs' (table expected, got nil)"), "{}", err);
}

#[test]
fn test_table_insert_and_remove() {
    let values = eval_source(
        r#"
        local t = {}
        table.insert(t, 'b')
        table.insert(t, 1, 'a')
        table.insert(t, 'c')
        local last = table.remove(t)
        local first = table.remove(t, 1)
        return table.concat(t, ','), last, first, #t
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::string("b"), Value::string("c"), Value::string("a"), Value::Int(1)]
    );
}

#[test]
fn test_table_insert_errors() {
    let err = eval_err("table.insert({}, 5, 'x')");
    assert!(err.ends_with("bad argument #2 to 'insert' (position out of bounds)"), "{}", err);
    let err = eval_err("table.insert({}, 1, 2, 3)");
    assert!(err.ends_with("wrong number of arguments to 'insert'"), "{}", err);
}

#[test]
fn test_table_remove_from_empty() {
    assert_eq!(eval_one("return table.remove({})"), Value::Nil);
}

#[test]
fn test_table_concat() {
    let values = eval_source("return table.concat({1, 2.5, 'x'}), table.concat({'a', 'b', 'c'}, '-', 2, 3), table.concat({})").unwrap();
    assert_eq!(values, strs(&["12.5x", "b-c", ""]));
    let err = eval_err("return table.concat({1, {}, 3})");
    assert!(err.ends_with("invalid value (at index 2) in table for 'concat'"), "{}", err);
}

#[test]
fn test_table_pack_unpack() {
    let values = eval_source(
        r#"
        local p = table.pack(1, nil, 3)
        return p.n, p[1], p[3], table.unpack({1, 2, 3})
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Int(3),
            Value::Int(1),
            Value::Int(3),
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
        ]
    );
    assert_eq!(eval_source("return table.unpack({1, 2, 3}, 2)").unwrap(), ints(&[2, 3]));
    assert_eq!(eval_source("return table.unpack({}, 1, 0)").unwrap(), vec![]);
    let err = eval_err("return table.unpack({}, 1, 1e8)");
    assert!(err.ends_with("too many results to unpack"), "{}", err);
}

#[test]
fn test_globals_table() {
    let values = eval_source("x = 5 return _G.x, _G._G == _G, _G.coroutine == coroutine").unwrap();
    assert_eq!(values, vec![Value::Int(5), Value::Bool(true), Value::Bool(true)]);
}
