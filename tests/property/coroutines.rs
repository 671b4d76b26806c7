// Property-based tests for coroutines
//
// Yield/resume value transfer, status transitions and generator
// ordering over random inputs.

use crate::common::{eval_source, ints};
use coluna::{Interpreter, Value, Values};
use proptest::prelude::*;

fn lua_list(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Property 1: Sequential yields come out in order
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn sequential_yields_in_order(values in prop::collection::vec(-1000i64..1000, 1..=12)) {
        let code = format!(
            r#"
            local co = coroutine.wrap(function(...)
                for _, v in ipairs({{...}}) do coroutine.yield(v) end
                return 'done'
            end)
            local out = {{co({})}}
            for i = 2, {} do out[i] = co() end
            return table.unpack(out)
            "#,
            lua_list(&values),
            values.len()
        );
        let result = eval_source(&code).map_err(TestCaseError::fail)?;
        prop_assert_eq!(result, ints(&values));
    }

    #[test]
    fn resume_arguments_become_yield_results(values in prop::collection::vec(any::<i64>(), 1..=8)) {
        // Each resume's argument is what the pending yield returns.
        let interp = Interpreter::new();
        let echo = interp
            .eval("return function(x) while true do x = coroutine.yield(x) end end")
            .map_err(|e| TestCaseError::fail(e.to_string()))?[0]
            .clone();
        let co = interp
            .create_coroutine(&echo)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        for v in &values {
            let args: Values = std::iter::once(Value::Int(*v)).collect();
            let out = interp
                .resume(&co, args)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(out.map(|vs| vs.into_vec()), Ok(vec![Value::Int(*v)]));
        }
        prop_assert_eq!(co.status().as_str(), "suspended");
    }

    #[test]
    fn yield_count_matches_resume_count(n in 0usize..20) {
        let code = format!(
            r#"
            local co = coroutine.create(function()
                for i = 1, {} do coroutine.yield(i) end
            end)
            local resumes = 0
            while coroutine.status(co) ~= 'dead' do
                assert(coroutine.resume(co))
                resumes = resumes + 1
            end
            return resumes, pcall(coroutine.resume, co)
            "#,
            n
        );
        let result = eval_source(&code).map_err(TestCaseError::fail)?;
        prop_assert_eq!(
            result,
            vec![
                Value::Int(n as i64 + 1),
                Value::Bool(false),
                Value::string("cannot resume dead coroutine"),
            ]
        );
    }

    #[test]
    fn error_in_body_kills_coroutine(before in 0usize..5, code in -100i64..100) {
        let src = format!(
            r#"
            local co = coroutine.create(function()
                for i = 1, {} do coroutine.yield(i) end
                error({})
            end)
            local last
            repeat last = table.pack(coroutine.resume(co)) until not last[1]
            return last[2], coroutine.status(co)
            "#,
            before, code
        );
        let result = eval_source(&src).map_err(TestCaseError::fail)?;
        prop_assert_eq!(result, vec![Value::Int(code), Value::string("dead")]);
    }
}
