// Error reporting: locations, operator messages, protected calls

use crate::common::{eval_err, eval_source, shallow_interpreter};
use coluna::{Config, Interpreter, Value};

#[test]
fn test_runtime_error_has_location() {
    let err = eval_err("local x = 1\nlocal y = x + {}");
    assert_eq!(err, "input:2: attempt to perform arithmetic on a table value");
}

#[test]
fn test_error_value_has_no_location() {
    let values = eval_source("return pcall(function() local t = nil; return t.x end)").unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(false),
            Value::string("attempt to index a nil value (local 't')")
        ]
    );
}

#[test]
fn test_operand_descriptions() {
    assert!(eval_err("return undefined_fn()").ends_with("attempt to call a nil value (global 'undefined_fn')"));
    assert!(eval_err("local t = {} return t.missing.x").ends_with("attempt to index a nil value (field 'missing')"));
    assert!(eval_err("local s = 'a' return s:upper()").ends_with("attempt to index a string value (local 's')"));
    assert!(eval_err("local t = {} t:go()").ends_with("attempt to call a nil value (method 'go')"));
    assert!(eval_err("return #5").ends_with("attempt to get length of a number value (constant)"));
    assert!(eval_err("local n return 'a' .. n").ends_with("attempt to concatenate a nil value (local 'n')"));
}

#[test]
fn test_comparison_errors() {
    assert!(eval_err("return 1 < 'x'").ends_with("attempt to compare number with string"));
    assert!(eval_err("return {} <= {}").ends_with("attempt to compare two table values"));
}

#[test]
fn test_integer_division_by_zero() {
    assert!(eval_err("return 1 // 0").ends_with("attempt to perform 'n//0'"));
    assert!(eval_err("return 1 % 0").ends_with("attempt to perform 'n%%0'"));
}

#[test]
fn test_syntax_errors() {
    assert_eq!(eval_err("while true do"), "input:1: 'end' expected near <eof>");
    assert_eq!(
        eval_err("while true do\nx = 1"),
        "input:2: 'end' expected (to close 'while' at line 1) near <eof>"
    );
    assert!(eval_err("local c <const> = 1; c = 2").contains("attempt to assign to const variable 'c'"));
    assert!(eval_err("break").contains("break outside a loop"));
    assert!(eval_err("function f() return ... end").contains("cannot use '...' outside a vararg function"));
}

#[test]
fn test_error_with_non_string_value() {
    let values = eval_source("return pcall(error, 42)").unwrap();
    assert_eq!(values, vec![Value::Bool(false), Value::Int(42)]);
    let values = eval_source("return pcall(error)").unwrap();
    assert_eq!(values, vec![Value::Bool(false), Value::Nil]);
}

#[test]
fn test_xpcall_handler() {
    let values = eval_source(
        r#"
        return xpcall(function(a) error(a * 2) end, function(e) return 'handled ' .. e end, 21)
        "#,
    )
    .unwrap();
    assert_eq!(values, vec![Value::Bool(false), Value::string("handled 42")]);
}

#[test]
fn test_assert() {
    assert!(eval_err("assert(false)").ends_with("assertion failed!"));
    assert!(eval_err("assert(nil, 'custom')").ends_with("custom"));
    let values = eval_source("return assert(1, 'unused')").unwrap();
    assert_eq!(values, vec![Value::Int(1), Value::string("unused")]);
}

#[test]
fn test_stack_overflow_on_main() {
    let interp = shallow_interpreter(40);
    let err = interp
        .eval("local function f(n) return f(n + 1) + 1 end return f(1)")
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert!(err.ends_with("stack overflow"), "{}", err);
}

#[test]
fn test_stack_overflow_inside_coroutine_is_captured() {
    let interp = shallow_interpreter(40);
    let values = interp
        .eval(
            r#"
            local function f(n) return f(n + 1) + 1 end
            local co = coroutine.create(function() return f(1) end)
            local ok, err = coroutine.resume(co)
            return ok, err, coroutine.status(co)
            "#,
        )
        .unwrap();
    assert_eq!(
        values.into_vec(),
        vec![
            Value::Bool(false),
            Value::string("stack overflow"),
            Value::string("dead")
        ]
    );
}

#[test]
fn test_call_depth_is_per_coroutine() {
    // Each coroutine counts its own nesting from zero.
    let interp = shallow_interpreter(30);
    let values = interp
        .eval(
            r#"
            local function down(n) if n == 0 then return 0 end return down(n - 1) + 1 end
            local function nest(k)
                if k == 0 then return down(20) end
                local co = coroutine.create(function() return nest(k - 1) end)
                local _, v = coroutine.resume(co)
                return v
            end
            return nest(5)
            "#,
        )
        .unwrap();
    assert_eq!(values.into_vec(), vec![Value::Int(20)]);
}

#[test]
fn test_nested_resumes_are_bounded() {
    let interp = Interpreter::with_config(Config::new().with_max_resume_depth(20));
    let values = interp
        .eval(
            r#"
            n = 0
            local function f()
                n = n + 1
                return coroutine.wrap(f)()
            end
            local ok, err = pcall(f)
            return ok, err, n
            "#,
        )
        .unwrap();
    assert_eq!(
        values.into_vec(),
        vec![
            Value::Bool(false),
            Value::string("C stack overflow"),
            Value::Int(21)
        ]
    );
    assert!(interp.coroutines().is_empty());
}

#[test]
fn test_refused_resume_leaves_coroutine_suspended() {
    let interp = Interpreter::with_config(Config::new().with_max_resume_depth(1));
    let values = interp
        .eval(
            r#"
            local inner = coroutine.create(function() return 'ran' end)
            local outer = coroutine.create(function()
                return pcall(coroutine.resume, inner)
            end)
            local _, ok, err = coroutine.resume(outer)
            return ok, err, coroutine.status(inner), coroutine.resume(inner)
            "#,
        )
        .unwrap();
    assert_eq!(
        values.into_vec(),
        vec![
            Value::Bool(false),
            Value::string("C stack overflow"),
            Value::string("suspended"),
            Value::Bool(true),
            Value::string("ran")
        ]
    );
}
