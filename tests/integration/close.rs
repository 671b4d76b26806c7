// Integration tests for coroutine.close and to-be-closed variables

use crate::common::{eval_err, eval_source, strs};
use coluna::Value;

#[test]
fn test_close_never_started() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function() error("never runs") end)
        local ok = coroutine.close(co)
        return ok, coroutine.status(co)
        "#,
    )
    .unwrap();
    assert_eq!(values, vec![Value::Bool(true), Value::string("dead")]);
}

#[test]
fn test_close_dead_succeeds() {
    let values = eval_source(
        r#"
        local done = coroutine.create(function() return 1 end)
        coroutine.resume(done)
        local failed = coroutine.create(function() error("x") end)
        coroutine.resume(failed)
        return coroutine.close(done), coroutine.close(failed)
        "#,
    )
    .unwrap();
    assert_eq!(values, vec![Value::Bool(true), Value::Bool(true)]);
}

#[test]
fn test_close_running_fails() {
    let values = eval_source(
        r#"
        local co = coroutine.create(function()
            return pcall(coroutine.close, coroutine.running())
        end)
        return coroutine.resume(co)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(true),
            Value::Bool(false),
            Value::string("cannot close a running coroutine"),
        ]
    );
}

#[test]
fn test_close_main_fails() {
    let err = eval_err("coroutine.close(coroutine.running())");
    assert!(err.ends_with("cannot close a running coroutine"), "{}", err);
}

#[test]
fn test_close_normal_fails() {
    let values = eval_source(
        r#"
        local outer
        outer = coroutine.create(function()
            local inner = coroutine.create(function()
                return pcall(coroutine.close, outer)
            end)
            return coroutine.resume(inner)
        end)
        return coroutine.resume(outer)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(true),
            Value::Bool(true),
            Value::Bool(false),
            Value::string("cannot close a normal coroutine"),
        ]
    );
}

#[test]
fn test_close_runs_pending_cleanup_in_reverse() {
    let values = eval_source(
        r#"
        local log = {}
        local co = coroutine.create(function()
            local a <close> = {__close = function(self, err) log[#log + 1] = 'a' end}
            local b <close> = {__close = function(self, err) log[#log + 1] = 'b' end}
            coroutine.yield()
            log[#log + 1] = 'unreachable'
        end)
        coroutine.resume(co)
        local ok = coroutine.close(co)
        return ok, table.concat(log, ','), coroutine.status(co)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::Bool(true), Value::string("b,a"), Value::string("dead")]
    );
}

#[test]
fn test_close_reports_first_cleanup_error() {
    let values = eval_source(
        r#"
        local seen = 'unset'
        local co = coroutine.create(function()
            local a <close> = {__close = function(self, err) seen = err end}
            local b <close> = {__close = function() error("first") end}
            local c <close> = {__close = function(self, err) end}
            coroutine.yield()
        end)
        coroutine.resume(co)
        local ok, err = coroutine.close(co)
        return ok, err, seen
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::Bool(false), Value::string("first"), Value::string("first")]
    );
}

#[test]
fn test_cleanup_hook_cannot_yield() {
    let values = eval_source(
        r#"
        local victim = coroutine.create(function()
            local r <close> = {__close = function() coroutine.yield(1) end}
            coroutine.yield()
        end)
        coroutine.resume(victim)
        local closer = coroutine.create(function()
            return coroutine.close(victim)
        end)
        return coroutine.resume(closer)
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![
            Value::Bool(true),
            Value::Bool(false),
            Value::string("attempt to yield across a non-yieldable boundary"),
        ]
    );
}

#[test]
fn test_closed_coroutine_cannot_resume() {
    let err = eval_err(
        r#"
        local co = coroutine.create(function() coroutine.yield() end)
        coroutine.resume(co)
        coroutine.close(co)
        coroutine.resume(co)
        "#,
    );
    assert!(err.ends_with("cannot resume dead coroutine"), "{}", err);
}

#[test]
fn test_block_exit_closes_in_reverse() {
    let values = eval_source(
        r#"
        local log = {}
        local function res(name)
            return {__close = function(self, err) log[#log + 1] = name end}
        end
        do
            local x <close> = res('x')
            local y <close> = res('y')
            log[#log + 1] = 'body'
        end
        return table.concat(log, ',')
        "#,
    )
    .unwrap();
    assert_eq!(values, strs(&["body,y,x"]));
}

#[test]
fn test_break_and_return_close() {
    let values = eval_source(
        r#"
        local log = {}
        local function res(name)
            return {__close = function() log[#log + 1] = name end}
        end
        for i = 1, 3 do
            local r <close> = res('loop' .. i)
            if i == 2 then break end
        end
        local function f()
            local r <close> = res('fn')
            return 'result'
        end
        local v = f()
        return table.concat(log, ','), v
        "#,
    )
    .unwrap();
    assert_eq!(values, strs(&["loop1,loop2,fn", "result"]));
}

#[test]
fn test_error_exit_passes_error_to_hook() {
    let values = eval_source(
        r#"
        local got
        local ok, err = pcall(function()
            local r <close> = {__close = function(self, e) got = e end}
            error("failure")
        end)
        return ok, err, got
        "#,
    )
    .unwrap();
    assert_eq!(
        values,
        vec![Value::Bool(false), Value::string("failure"), Value::string("failure")]
    );
}

#[test]
fn test_nil_and_false_are_closable() {
    let values = eval_source(
        r#"
        do
            local a <close> = nil
            local b <close> = false
        end
        return 'ok'
        "#,
    )
    .unwrap();
    assert_eq!(values, strs(&["ok"]));
}

#[test]
fn test_non_closable_value_rejected() {
    let err = eval_err("local x <close> = 42");
    assert!(err.ends_with("variable 'x' got a non-closable value"), "{}", err);
}

#[test]
fn test_cleanup_after_yield_on_normal_exit() {
    let values = eval_source(
        r#"
        local log = {}
        local co = coroutine.wrap(function()
            local r <close> = {__close = function() log[#log + 1] = 'closed' end}
            coroutine.yield('first')
            log[#log + 1] = 'resumed'
        end)
        co()
        co()
        return table.concat(log, ',')
        "#,
    )
    .unwrap();
    assert_eq!(values, strs(&["resumed,closed"]));
}

#[test]
fn test_abandoned_coroutine_is_released() {
    // Abandoning a suspended coroutine never runs its cleanup hooks.
    let values = eval_source(
        r#"
        local log = {}
        do
            local co = coroutine.create(function()
                local r <close> = {__close = function() log[#log + 1] = 'hook' end}
                coroutine.yield()
            end)
            coroutine.resume(co)
        end
        return #log
        "#,
    )
    .unwrap();
    assert_eq!(values, vec![Value::Int(0)]);
}
