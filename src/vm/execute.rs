//! Statement execution.

use super::{fresh_cell, is_closable, Flow, Frame};
use crate::error::{LError, LResult};
use crate::reader::ast::{Attrib, Block, Expr, LocalTarget, Stat, StatKind};
use crate::reader::SourceLoc;
use crate::value::number::float_to_int;
use crate::value::Value;
use smallvec::smallvec;

/// Assignment destination, resolved before the right-hand side runs.
enum Place {
    Local(usize),
    Upvalue(usize),
    Global(Value),
    Index(Value, Value, String),
}

impl<'f, 'a> Frame<'f, 'a> {
    pub(crate) fn exec_block(&mut self, block: &Block) -> LResult<Flow> {
        if !block.has_close {
            return self.exec_stats(&block.stats);
        }
        let mark = self.cx.cleanup_mark();
        let result = self.exec_stats(&block.stats);
        self.cx.close_pending(mark, result)
    }

    fn exec_stats(&mut self, stats: &[Stat]) -> LResult<Flow> {
        for stat in stats {
            match self.exec_stat(stat)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stat(&mut self, stat: &Stat) -> LResult<Flow> {
        self.exec_kind(&stat.kind).map_err(|e| {
            e.at(SourceLoc {
                chunk: self.closure.proto.chunk.clone(),
                line: stat.line,
            })
        })
    }

    fn exec_kind(&mut self, kind: &StatKind) -> LResult<Flow> {
        match kind {
            StatKind::Expr(expr) => {
                self.eval_multi(expr)?;
            }
            StatKind::Local { targets, exprs } => {
                let values = self.eval_adjusted(exprs, targets.len())?;
                for (target, value) in targets.iter().zip(values) {
                    self.declare(target, value)?;
                }
            }
            StatKind::Assign { targets, exprs } => {
                let mut places = Vec::with_capacity(targets.len());
                for target in targets {
                    places.push(self.place(target)?);
                }
                let values = self.eval_adjusted(exprs, targets.len())?;
                for (place, value) in places.into_iter().zip(values) {
                    self.store(place, value)?;
                }
            }
            StatKind::LocalFunction { slot, func } => {
                let cell = fresh_cell(Value::Nil);
                self.slots[*slot] = cell.clone();
                // The closure captures its own cell, so it can recurse
                *cell.borrow_mut() = self.make_closure(func);
            }
            StatKind::Do(block) => return self.exec_block(block),
            StatKind::While { cond, body } => {
                while self.eval(cond)?.is_truthy() {
                    match self.exec_block(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            StatKind::Repeat { body, cond } => loop {
                let round = if body.has_close {
                    let mark = self.cx.cleanup_mark();
                    let result = self.repeat_round(body, cond);
                    self.cx.close_pending(mark, result)?
                } else {
                    self.repeat_round(body, cond)?
                };
                match round {
                    Flow::Normal => {}
                    Flow::Break => break,
                    flow @ Flow::Return(_) => return Ok(flow),
                }
            },
            StatKind::If {
                branches,
                otherwise,
            } => {
                for (cond, block) in branches {
                    if self.eval(cond)?.is_truthy() {
                        return self.exec_block(block);
                    }
                }
                if let Some(block) = otherwise {
                    return self.exec_block(block);
                }
            }
            StatKind::NumericFor {
                var,
                start,
                limit,
                step,
                body,
            } => return self.numeric_for(*var, start, limit, step.as_ref(), body),
            StatKind::GenericFor { vars, exprs, body } => {
                return self.generic_for(vars, exprs, body)
            }
            StatKind::Return(exprs) => return Ok(Flow::Return(self.eval_all(exprs)?)),
            StatKind::Break => return Ok(Flow::Break),
        }
        Ok(Flow::Normal)
    }

    /// One pass of a `repeat` body plus its condition, in the body's scope.
    /// `Break` means leave the loop.
    fn repeat_round(&mut self, body: &Block, cond: &Expr) -> LResult<Flow> {
        match self.exec_stats(&body.stats)? {
            Flow::Normal => {
                if self.eval(cond)?.is_truthy() {
                    Ok(Flow::Break)
                } else {
                    Ok(Flow::Normal)
                }
            }
            flow => Ok(flow),
        }
    }

    fn declare(&mut self, target: &LocalTarget, value: Value) -> LResult<()> {
        if target.attrib == Attrib::Close {
            if !is_closable(&value) {
                let name = &self.closure.proto.local_names[target.slot];
                return Err(LError::runtime(format!(
                    "variable '{}' got a non-closable value",
                    name
                )));
            }
            if value.is_truthy() {
                self.cx.push_cleanup(value.clone());
            }
        }
        self.slots[target.slot] = fresh_cell(value);
        Ok(())
    }

    fn place(&mut self, target: &Expr) -> LResult<Place> {
        Ok(match target {
            Expr::Local(slot) => Place::Local(*slot),
            Expr::Upvalue(i) => Place::Upvalue(*i),
            Expr::Global(name) => Place::Global(Value::Str(name.clone())),
            Expr::Index(obj, key) => {
                let table = self.eval(obj)?;
                let key = self.eval(key)?;
                Place::Index(table, key, self.describe(obj))
            }
            _ => return Err(LError::runtime("cannot assign to this expression")),
        })
    }

    fn store(&mut self, place: Place, value: Value) -> LResult<()> {
        match place {
            Place::Local(slot) => *self.slots[slot].borrow_mut() = value,
            Place::Upvalue(i) => *self.closure.upvalues[i].borrow_mut() = value,
            Place::Global(name) => self.cx.globals().set(name, value)?,
            Place::Index(Value::Table(t), key, _) => t.set(key, value)?,
            Place::Index(other, _, desc) => {
                return Err(LError::runtime(format!(
                    "attempt to index a {} value{}",
                    other.type_name(),
                    desc
                )))
            }
        }
        Ok(())
    }

    fn run_loop_body(&mut self, body: &Block) -> LResult<Option<Flow>> {
        match self.exec_block(body)? {
            Flow::Normal => Ok(None),
            Flow::Break => Ok(Some(Flow::Normal)),
            flow @ Flow::Return(_) => Ok(Some(flow)),
        }
    }

    fn numeric_for(
        &mut self,
        var: usize,
        start: &Expr,
        limit: &Expr,
        step: Option<&Expr>,
        body: &Block,
    ) -> LResult<Flow> {
        let start = for_number(self.eval(start)?, "initial")?;
        let limit = for_number(self.eval(limit)?, "limit")?;
        let step = match step {
            Some(expr) => for_number(self.eval(expr)?, "step")?,
            None => Value::Int(1),
        };

        if let (Value::Int(first), Value::Int(step)) = (&start, &step) {
            let (first, step) = (*first, *step);
            if step == 0 {
                return Err(LError::runtime("'for' step is zero"));
            }
            let last = match int_limit(&limit, step) {
                Some(last) => last,
                None => return Ok(Flow::Normal),
            };
            if (step > 0 && first > last) || (step < 0 && first < last) {
                return Ok(Flow::Normal);
            }
            let count = (last as i128 - first as i128) / step as i128;
            let mut i = first;
            for n in 0..=count {
                self.slots[var] = fresh_cell(Value::Int(i));
                if let Some(flow) = self.run_loop_body(body)? {
                    return Ok(flow);
                }
                if n < count {
                    i = i.wrapping_add(step);
                }
            }
            return Ok(Flow::Normal);
        }

        let to_f64 = |v: &Value| match v {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            _ => f64::NAN,
        };
        let (mut i, limit, step) = (to_f64(&start), to_f64(&limit), to_f64(&step));
        if step == 0.0 {
            return Err(LError::runtime("'for' step is zero"));
        }
        while (step > 0.0 && i <= limit) || (step < 0.0 && i >= limit) {
            self.slots[var] = fresh_cell(Value::Float(i));
            if let Some(flow) = self.run_loop_body(body)? {
                return Ok(flow);
            }
            i += step;
        }
        Ok(Flow::Normal)
    }

    fn generic_for(&mut self, vars: &[usize], exprs: &[Expr], body: &Block) -> LResult<Flow> {
        let mut init = self.eval_adjusted(exprs, 3)?.into_iter();
        let iter = init.next().unwrap_or_default();
        let state = init.next().unwrap_or_default();
        let mut control = init.next().unwrap_or_default();

        if !matches!(iter, Value::Function(_)) {
            return Err(LError::runtime(format!(
                "attempt to call a {} value (for iterator)",
                iter.type_name()
            )));
        }
        loop {
            let results = self.cx.call(&iter, smallvec![state.clone(), control.clone()])?;
            let first = results.first().cloned().unwrap_or_default();
            if first.is_nil() {
                return Ok(Flow::Normal);
            }
            control = first;
            let mut results = results.into_iter();
            for &slot in vars {
                self.slots[slot] = fresh_cell(results.next().unwrap_or_default());
            }
            if let Some(flow) = self.run_loop_body(body)? {
                return Ok(flow);
            }
        }
    }
}

fn for_number(value: Value, what: &str) -> LResult<Value> {
    match value.to_number() {
        Some(n) if !matches!(value, Value::Str(_)) => Ok(n),
        _ => Err(LError::runtime(format!("'for' {} value must be a number", what))),
    }
}

/// Clip a loop limit to an integer. `None` when the loop must not run.
fn int_limit(limit: &Value, step: i64) -> Option<i64> {
    match limit {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.is_nan() => None,
        Value::Float(f) => {
            let clipped = if step > 0 { f.floor() } else { f.ceil() };
            match float_to_int(clipped) {
                Some(i) => Some(i),
                // Beyond the integer range: saturate, or skip the loop
                // when the limit is on the wrong side of every integer.
                None if clipped > 0.0 => (step > 0).then_some(i64::MAX),
                None => (step < 0).then_some(i64::MIN),
            }
        }
        _ => None,
    }
}
