// Integration tests for the coroutine library
// - Basic yield/resume and value handoff
// - Status transitions, including "normal" for resumers
// - wrap, running, isyieldable
// - Yielding through nested calls, pcall and native bodies
// - Usage errors versus body errors

use crate::common::{eval_err, eval_one, eval_source, ints, strs};
use coluna::Value;

#[test]
fn test_yield_then_return_scenario() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function()
            coroutine.yield(1, 2)
            return 3
        end)
        local a, b, c = coroutine.resume(co)
        local d, e = coroutine.resume(co)
        return a, b, c, d, e, coroutine.status(co)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(true),
            Value::Int(1),
            Value::Int(2),
            Value::Bool(true),
            Value::Int(3),
            Value::string("dead"),
        ]
    );
}

#[test]
fn test_resume_dead_is_usage_error() {
    let err = eval_err(
        r#"
        local co = coroutine.create(function() end)
        coroutine.resume(co)
        coroutine.resume(co)
        "#,
    );
    assert!(err.ends_with("cannot resume dead coroutine"), "{}", err);
}

#[test]
fn test_resume_dead_through_pcall() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function() end)
        coroutine.resume(co)
        return pcall(coroutine.resume, co)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::Bool(false), Value::string("cannot resume dead coroutine")]
    );
}

#[test]
fn test_fresh_coroutine_is_suspended() {
    assert_eq!(
        eval_one("return coroutine.status(coroutine.create(function() end))"),
        Value::string("suspended")
    );
}

#[test]
fn test_first_resume_passes_parameters() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function(a, b, ...)
            return a + b, select('#', ...)
        end)
        return coroutine.resume(co, 10, 20, 'x', 'y')
        "#,
    )
    .unwrap();
    assert_eq!(values, vec![Value::Bool(true), Value::Int(30), Value::Int(2)]);
}

#[test]
fn test_resume_values_become_yield_results() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function()
            local x, y = coroutine.yield()
            local z = coroutine.yield(x * y)
            return z
        end)
        coroutine.resume(co)
        local _, product = coroutine.resume(co, 6, 7)
        local _, last = coroutine.resume(co, 'done')
        return product, last
        "#,
    )
    .unwrap();
    assert_eq!(values, vec![Value::Int(42), Value::string("done")]);
}

#[test]
fn test_yield_returns_exact_arity() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function()
            return select('#', coroutine.yield())
        end)
        coroutine.resume(co)
        return coroutine.resume(co, nil, nil, nil)
        "#,
    )
    .unwrap();
    assert_eq!(values, vec![Value::Bool(true), Value::Int(3)]);
}

#[test]
fn test_body_error_is_captured() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function() error("boom") end)
        local ok, err = coroutine.resume(co)
        return ok, err, coroutine.status(co)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::Bool(false), Value::string("boom"), Value::string("dead")]
    );
}

#[test]
fn test_error_value_is_not_stringified() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function() error({code = 7}) end)
        local ok, err = coroutine.resume(co)
        return ok, type(err), err.code
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::Bool(false), Value::string("table"), Value::Int(7)]
    );
}

#[test]
fn test_runtime_error_message_in_body() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function()
            local t = nil
            return t.field
        end)
        return coroutine.resume(co)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(false),
            Value::string("attempt to index a nil value (local 't')")
        ]
    );
}

#[test]
fn test_yield_from_main_fails() {
    let err = eval_err("coroutine.yield(1)");
    assert!(err.ends_with("attempt to yield from outside a coroutine"), "{}", err);
}

#[test]
fn test_resumer_is_normal() {
    let values = eval_source(
        r#"
        local outer
        outer = coroutine.create(function()
            local inner = coroutine.create(function()
                return coroutine.status(outer)
            end)
            local _, seen = coroutine.resume(inner)
            return seen, coroutine.status(outer)
        end)
        return coroutine.resume(outer)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::Bool(true), Value::string("normal"), Value::string("running")]
    );
}

#[test]
fn test_resume_running_and_normal_fail() {
    let values = eval_source(
        r#"
        local self_co
        self_co = coroutine.create(function()
            return coroutine.resume(self_co)
        end)
        local ok1, err1 = coroutine.resume(self_co)

        local a, b
        a = coroutine.create(function()
            return coroutine.resume(b)
        end)
        b = coroutine.create(function()
            return coroutine.resume(a)
        end)
        local ok2, ok3, err3 = coroutine.resume(a)
        return ok1, err1, ok2, ok3, err3
        "#,
    )
    .unwrap();
    assert_eq!(values[0], Value::Bool(false));
    assert_eq!(values[1], Value::string("cannot resume running coroutine"));
    // b's body raised while a was normal; a returns b's outcome
    assert_eq!(values[2], Value::Bool(true));
    assert_eq!(values[3], Value::Bool(false));
    assert_eq!(
        values[4],
        Value::string("cannot resume non-suspended coroutine")
    );
}

#[test]
fn test_status_running_inside_body() {
    assert_eq!(
        eval_one(
            r#"
            local co
            co = coroutine.create(function() return coroutine.status(co) end)
            local _, s = coroutine.resume(co)
            return s
            "#
        ),
        Value::string("running")
    );
}

#[test]
fn test_running_on_main_and_in_coroutine() {
    let values = eval_source(
        r#"
        local main, ismain = coroutine.running()
        local co
        co = coroutine.create(function()
            local me, flag = coroutine.running()
            return me == co, flag
        end)
        local _, same, flag = coroutine.resume(co)
        return ismain, coroutine.status(main), same, flag, type(main)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(true),
            Value::string("running"),
            Value::Bool(true),
            Value::Bool(false),
            Value::string("thread"),
        ]
    );
}

#[test]
fn test_isyieldable() {
    let values = eval_source(
        r#"
        local main = coroutine.running()
        local co = coroutine.create(function()
            return coroutine.isyieldable(), coroutine.isyieldable(main)
        end)
        local _, inside, of_main = coroutine.resume(co)
        return coroutine.isyieldable(), inside, of_main, coroutine.isyieldable(co)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(false),
            Value::Bool(true),
            Value::Bool(false),
            Value::Bool(true),
        ]
    );
}

#[test]
fn test_wrap_generator() {
    let values = eval_source(
        r#"
        local gen = coroutine.wrap(function(n)
            for i = 1, n do coroutine.yield(i * i) end
            return 'end'
        end)
        return gen(3), gen(), gen(), gen()
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::Int(1), Value::Int(4), Value::Int(9), Value::string("end")]
    );
}

#[test]
fn test_wrap_raises_body_error() {
    let values = eval_source(
        r#"
        local f = coroutine.wrap(function()
            coroutine.yield(1)
            error("bad")
        end)
        local first = f()
        local ok, err = pcall(f)
        local ok2, err2 = pcall(f)
        return first, ok, err, ok2, err2
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Int(1),
            Value::Bool(false),
            Value::string("bad"),
            Value::Bool(false),
            Value::string("cannot resume dead coroutine"),
        ]
    );
}

#[test]
fn test_wrap_rejects_native() {
    let err = eval_err("coroutine.wrap(print)");
    assert!(
        err.ends_with("bad argument #1 to 'wrap' (interpreted function expected)"),
        "{}",
        err
    );
}

#[test]
fn test_create_requires_function() {
    let err = eval_err("coroutine.create(42)");
    assert!(
        err.ends_with("bad argument #1 to 'create' (function expected, got number)"),
        "{}",
        err
    );
}

#[test]
fn test_resume_requires_coroutine() {
    let err = eval_err("coroutine.resume({})");
    assert!(
        err.ends_with("bad argument #1 to 'resume' (coroutine expected, got table)"),
        "{}",
        err
    );
}

#[test]
fn test_yield_across_nested_calls() {
    let values = eval_source(
        r#"
        local function walk(node)
            if node == nil then return end
            walk(node.left)
            coroutine.yield(node.value)
            walk(node.right)
        end
        local tree = {
            value = 4,
            left = {value = 2, left = {value = 1}, right = {value = 3}},
            right = {value = 6, left = {value = 5}},
        }
        local out = {}
        for v in coroutine.wrap(function() walk(tree) end) do
            out[#out + 1] = v
        end
        return table.unpack(out)
        "#,
    )
    .unwrap();
    assert_eq!(values, ints(&[1, 2, 3, 4, 5, 6]));
}

#[test]
fn test_yield_through_pcall() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function()
            local ok, v = pcall(function()
                return coroutine.yield('paused') + 1
            end)
            return ok, v
        end)
        local _, msg = coroutine.resume(co)
        local _, ok, v = coroutine.resume(co, 41)
        return msg, ok, v
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::string("paused"), Value::Bool(true), Value::Int(42)]
    );
}

#[test]
fn test_yield_through_native_iterator() {
    // The loop is driven by a native iterator; the body yields between steps.
    let values = eval_source(
        r#"
        local co = coroutine.wrap(function()
            local seen = 0
            for i, v in ipairs({10, 20, 30}) do
                seen = seen + coroutine.yield(v)
            end
            return seen
        end)
        return co(), co(1), co(2), co(3)
        "#,
    )
    .unwrap();
    assert_eq!(values, ints(&[10, 20, 30, 6]));
}

#[test]
fn test_native_body() {
    let values = eval_source(
        r#"
        local co = coroutine.create(coroutine.yield)
        local a, b, c = coroutine.resume(co, 1, 2)
        local s = coroutine.status(co)
        local d, e = coroutine.resume(co, 'back')
        return a, b, c, s, d, e, coroutine.status(co)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(true),
            Value::Int(1),
            Value::Int(2),
            Value::string("suspended"),
            Value::Bool(true),
            Value::string("back"),
            Value::string("dead"),
        ]
    );
}

#[test]
fn test_shared_upvalues() {
    let values = eval_source(
        r#"
        local counter = 0
        local co = coroutine.wrap(function()
            while true do
                counter = counter + 1
                coroutine.yield()
            end
        end)
        co() co() co()
        counter = counter * 10
        co()
        return counter
        "#,
    )
    .unwrap();
    assert_eq!(values, ints(&[31]));
}

#[test]
fn test_producer_consumer() {
    let values = eval_source(
        r#"
        local function producer(items)
            return coroutine.create(function()
                for _, item in ipairs(items) do coroutine.yield(item) end
            end)
        end
        local function filter(source, keep)
            return coroutine.create(function()
                while true do
                    local ok, item = coroutine.resume(source)
                    if item == nil then return end
                    if keep(item) then coroutine.yield(item) end
                end
            end)
        end
        local evens = filter(producer({1, 2, 3, 4, 5, 6}), function(x) return x % 2 == 0 end)
        local out = {}
        while true do
            local _, v = coroutine.resume(evens)
            if v == nil then break end
            out[#out + 1] = v
        end
        return table.concat(out, ',')
        "#,
    )
    .unwrap();
    assert_eq!(values, strs(&["2,4,6"]));
}

#[test]
fn test_many_live_coroutines() {
    assert_eq!(
        eval_one(
            r#"
            local cos = {}
            for i = 1, 50 do
                cos[i] = coroutine.create(function(x) coroutine.yield(x) return x * 2 end)
            end
            local sum = 0
            for i = 1, 50 do
                local _, v = coroutine.resume(cos[i], i)
                sum = sum + v
            end
            for i = 1, 50 do
                local _, v = coroutine.resume(cos[i])
                sum = sum + v
            end
            return sum
            "#
        ),
        Value::Int(3 * 50 * 51 / 2)
    );
}

#[test]
fn test_deeply_nested_resumes() {
    assert_eq!(
        eval_one(
            r#"
            local function nest(n)
                if n == 0 then return 0 end
                local co = coroutine.create(function() return nest(n - 1) + 1 end)
                local _, v = coroutine.resume(co)
                return v
            end
            return nest(20)
            "#
        ),
        Value::Int(20)
    );
}
