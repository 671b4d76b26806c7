//! Expression evaluation.

use super::arithmetic::{self, concat};
use super::comparison::{less_equal, less_than};
use super::{Frame, OpError, Side};
use crate::error::{LError, LResult};
use crate::reader::ast::{BinOp, Expr, Field, FunctionProto, UpvalueDesc};
use crate::value::{Function, LuaClosure, TableRef, Value, Values};
use smallvec::smallvec;
use std::rc::Rc;

impl<'f, 'a> Frame<'f, 'a> {
    /// Evaluate to exactly one value.
    pub(crate) fn eval(&mut self, expr: &Expr) -> LResult<Value> {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::True => Ok(Value::Bool(true)),
            Expr::False => Ok(Value::Bool(false)),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Local(slot) => Ok(self.slots[*slot].borrow().clone()),
            Expr::Upvalue(i) => Ok(self.closure.upvalues[*i].borrow().clone()),
            Expr::Global(name) => Ok(self.cx.globals().get_str(name)),
            Expr::Index(obj, key) => {
                let table = self.eval(obj)?;
                let key = self.eval(key)?;
                self.index(&table, &key, obj)
            }
            Expr::Function(proto) => Ok(self.make_closure(proto)),
            Expr::Table(fields) => self.construct(fields),
            Expr::Binary(op, lhs, rhs) => self.binary(*op, lhs, rhs),
            Expr::Unary(op, operand) => {
                let v = self.eval(operand)?;
                arithmetic::unary(*op, &v).map_err(|e| self.op_error(e, &v, operand, &v, operand))
            }
            Expr::And(lhs, rhs) => {
                let v = self.eval(lhs)?;
                if v.is_truthy() {
                    self.eval(rhs)
                } else {
                    Ok(v)
                }
            }
            Expr::Or(lhs, rhs) => {
                let v = self.eval(lhs)?;
                if v.is_truthy() {
                    Ok(v)
                } else {
                    self.eval(rhs)
                }
            }
            Expr::Paren(inner) => self.eval(inner),
            Expr::Vararg | Expr::Call(..) | Expr::Method(..) => {
                Ok(self.eval_multi(expr)?.into_iter().next().unwrap_or_default())
            }
        }
    }

    /// Evaluate keeping every value a call or `...` produces.
    pub(crate) fn eval_multi(&mut self, expr: &Expr) -> LResult<Values> {
        match expr {
            Expr::Vararg => Ok(self.varargs.clone()),
            Expr::Call(callee, args) => {
                let func = self.eval(callee)?;
                let args = self.eval_all(args)?;
                self.call_value(&func, args, callee)
            }
            Expr::Method(obj, name, args) => {
                let target = self.eval(obj)?;
                let method = self.index(&target, &Value::Str(name.clone()), obj)?;
                let mut all = Values::with_capacity(args.len() + 1);
                all.push(target);
                all.extend(self.eval_all(args)?);
                if !matches!(method, Value::Function(_)) {
                    return Err(LError::runtime(format!(
                        "attempt to call a {} value (method '{}')",
                        method.type_name(),
                        name
                    )));
                }
                self.cx.call(&method, all)
            }
            other => Ok(smallvec![self.eval(other)?]),
        }
    }

    /// Evaluate a list, expanding only the last expression.
    pub(crate) fn eval_all(&mut self, exprs: &[Expr]) -> LResult<Values> {
        let mut values = Values::with_capacity(exprs.len());
        if let Some((last, init)) = exprs.split_last() {
            for expr in init {
                values.push(self.eval(expr)?);
            }
            values.extend(self.eval_multi(last)?);
        }
        Ok(values)
    }

    /// Evaluate a list and pad or truncate it to `n` values.
    pub(crate) fn eval_adjusted(&mut self, exprs: &[Expr], n: usize) -> LResult<Values> {
        let mut values = self.eval_all(exprs)?;
        values.resize(n, Value::Nil);
        Ok(values)
    }

    fn call_value(&mut self, func: &Value, args: Values, callee: &Expr) -> LResult<Values> {
        if !matches!(func, Value::Function(_)) {
            return Err(LError::runtime(format!(
                "attempt to call a {} value{}",
                func.type_name(),
                self.describe(callee)
            )));
        }
        self.cx.call(func, args)
    }

    fn index(&self, table: &Value, key: &Value, obj: &Expr) -> LResult<Value> {
        match table {
            Value::Table(t) => Ok(t.get(key)),
            other => Err(LError::runtime(format!(
                "attempt to index a {} value{}",
                other.type_name(),
                self.describe(obj)
            ))),
        }
    }

    /// Variable description appended to operand errors, e.g. ` (local 'x')`.
    pub(crate) fn describe(&self, expr: &Expr) -> String {
        let proto = &self.closure.proto;
        match expr {
            Expr::Local(slot) => format!(" (local '{}')", proto.local_names[*slot]),
            Expr::Upvalue(i) => format!(" (upvalue '{}')", proto.upvalue_names[*i]),
            Expr::Global(name) => format!(" (global '{}')", name),
            Expr::Index(_, key) => match key.as_ref() {
                Expr::Str(name) => format!(" (field '{}')", name),
                _ => String::new(),
            },
            Expr::Method(_, name, _) => format!(" (method '{}')", name),
            Expr::Str(_) | Expr::Int(_) | Expr::Float(_) => " (constant)".to_string(),
            _ => String::new(),
        }
    }

    fn op_error(&self, err: OpError, left: &Value, lexpr: &Expr, right: &Value, rexpr: &Expr) -> LError {
        match err {
            OpError::Fail(e) => e,
            OpError::Operand(side, verb) => {
                let (value, expr) = match side {
                    Side::Left => (left, lexpr),
                    Side::Right => (right, rexpr),
                };
                LError::runtime(format!(
                    "attempt to {} a {} value{}",
                    verb,
                    value.type_name(),
                    self.describe(expr)
                ))
            }
        }
    }

    fn binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> LResult<Value> {
        let a = self.eval(lhs)?;
        let b = self.eval(rhs)?;
        let result = match op {
            BinOp::Eq => Ok(Value::Bool(a == b)),
            BinOp::Ne => Ok(Value::Bool(a != b)),
            BinOp::Lt => less_than(&a, &b).map(Value::Bool),
            BinOp::Le => less_equal(&a, &b).map(Value::Bool),
            BinOp::Gt => less_than(&b, &a).map(Value::Bool),
            BinOp::Ge => less_equal(&b, &a).map(Value::Bool),
            BinOp::Concat => concat(&a, &b),
            _ => arithmetic::arith(op, &a, &b),
        };
        result.map_err(|e| self.op_error(e, &a, lhs, &b, rhs))
    }

    fn construct(&mut self, fields: &[Field]) -> LResult<Value> {
        let table = TableRef::new();
        let mut next = 1;
        for (i, field) in fields.iter().enumerate() {
            match field {
                Field::Positional(expr) if i + 1 == fields.len() && expr.is_multi() => {
                    for value in self.eval_multi(expr)? {
                        table.set(Value::Int(next), value)?;
                        next += 1;
                    }
                }
                Field::Positional(expr) => {
                    let value = self.eval(expr)?;
                    table.set(Value::Int(next), value)?;
                    next += 1;
                }
                Field::Named(name, expr) => {
                    let value = self.eval(expr)?;
                    table.set(Value::Str(name.clone()), value)?;
                }
                Field::Keyed(key, expr) => {
                    let key = self.eval(key)?;
                    let value = self.eval(expr)?;
                    table.set(key, value)?;
                }
            }
        }
        Ok(Value::Table(table))
    }

    pub(crate) fn make_closure(&self, proto: &Rc<FunctionProto>) -> Value {
        let upvalues = proto
            .upvalues
            .iter()
            .map(|desc| match desc {
                UpvalueDesc::Local(slot) => self.slots[*slot].clone(),
                UpvalueDesc::Upvalue(i) => self.closure.upvalues[*i].clone(),
            })
            .collect();
        Value::Function(Function::Lua(Rc::new(LuaClosure {
            proto: proto.clone(),
            upvalues,
        })))
    }
}
