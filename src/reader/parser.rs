//! Recursive-descent parser with parse-time name resolution.

use super::ast::{
    Attrib, BinOp, Block, Expr, Field, FunctionProto, LocalTarget, Stat, StatKind, UnOp,
    UpvalueDesc,
};
use super::token::{SourceLoc, Token, TokenWithLoc};
use crate::error::{LError, LResult};
use std::rc::Rc;

const UNARY_PRIORITY: u8 = 12;

/// Left and right binding power of each binary operator.
fn priority(token: &Token) -> Option<(u8, u8)> {
    Some(match token {
        Token::Or => (1, 1),
        Token::And => (2, 2),
        Token::Lt | Token::Gt | Token::Le | Token::Ge | Token::Ne | Token::Eq => (3, 3),
        Token::Concat => (9, 8),
        Token::Plus | Token::Minus => (10, 10),
        Token::Star | Token::Slash | Token::DoubleSlash | Token::Percent => (11, 11),
        Token::Caret => (14, 13),
        _ => return None,
    })
}

fn combine(token: &Token, left: Expr, right: Expr) -> Expr {
    let (left, right) = (Box::new(left), Box::new(right));
    let op = match token {
        Token::And => return Expr::And(left, right),
        Token::Or => return Expr::Or(left, right),
        Token::Lt => BinOp::Lt,
        Token::Gt => BinOp::Gt,
        Token::Le => BinOp::Le,
        Token::Ge => BinOp::Ge,
        Token::Ne => BinOp::Ne,
        Token::Concat => BinOp::Concat,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::DoubleSlash => BinOp::IDiv,
        Token::Percent => BinOp::Mod,
        Token::Caret => BinOp::Pow,
        // only `==` is left
        _ => BinOp::Eq,
    };
    Expr::Binary(op, left, right)
}

fn unary_op(token: &Token) -> Option<UnOp> {
    match token {
        Token::Minus => Some(UnOp::Neg),
        Token::Not => Some(UnOp::Not),
        Token::Hash => Some(UnOp::Len),
        _ => None,
    }
}

enum Resolved {
    Local(usize, Attrib),
    Upvalue(usize, Attrib),
    Global,
}

#[derive(Default)]
struct Scope {
    vars: Vec<(Rc<str>, usize, Attrib)>,
}

/// Per-function parsing state.
#[derive(Default)]
struct FuncState {
    scopes: Vec<Scope>,
    local_names: Vec<Rc<str>>,
    slot_attribs: Vec<Attrib>,
    upvalues: Vec<UpvalueDesc>,
    upvalue_names: Vec<Rc<str>>,
    upvalue_attribs: Vec<Attrib>,
    is_vararg: bool,
    loop_depth: usize,
}

pub struct Parser {
    tokens: Vec<TokenWithLoc>,
    pos: usize,
    chunk: Rc<str>,
    funcs: Vec<FuncState>,
}

impl Parser {
    /// `tokens` must end with `Token::Eof`, as `Lexer::tokenize` produces.
    pub fn new(tokens: Vec<TokenWithLoc>, chunk: impl AsRef<str>) -> Self {
        Parser {
            tokens,
            pos: 0,
            chunk: Rc::from(chunk.as_ref()),
            funcs: Vec::new(),
        }
    }

    pub fn parse_chunk(mut self) -> LResult<Rc<FunctionProto>> {
        self.open_function(true);
        let body = self.block_body()?;
        if !self.check(&Token::Eof) {
            return Err(self.error_near("'<eof>' expected"));
        }
        Ok(self.close_function("main chunk".to_string(), 0, Vec::new(), body))
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let i = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        self.tokens.get(i).map_or(&Token::Eof, |t| &t.token)
    }

    fn line(&self) -> usize {
        let i = self.pos.min(self.tokens.len().saturating_sub(1));
        self.tokens.get(i).map_or(0, |t| t.line)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn accept(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> LResult<()> {
        if self.accept(&token) {
            Ok(())
        } else {
            Err(self.error_near(format!("'{}' expected", token)))
        }
    }

    /// Expect the closer of a construct opened on another line.
    fn expect_match(&mut self, closer: Token, opener: Token, line: usize) -> LResult<()> {
        if self.accept(&closer) {
            return Ok(());
        }
        if line == self.line() {
            Err(self.error_near(format!("'{}' expected", closer)))
        } else {
            Err(self.error_near(format!(
                "'{}' expected (to close '{}' at line {})",
                closer, opener, line
            )))
        }
    }

    fn expect_name(&mut self) -> LResult<Rc<str>> {
        match self.peek() {
            Token::Name(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_near("<name> expected")),
        }
    }

    fn error(&self, message: impl Into<String>) -> LError {
        LError::syntax(message, SourceLoc::new(&self.chunk, self.line()))
    }

    fn error_near(&self, message: impl Into<String>) -> LError {
        let near = match self.peek() {
            Token::Eof => "<eof>".to_string(),
            tok => format!("'{}'", tok),
        };
        self.error(format!("{} near {}", message.into(), near))
    }

    // ------------------------------------------------------------------
    // Scopes and name resolution
    // ------------------------------------------------------------------

    fn fs(&mut self) -> &mut FuncState {
        let last = self.funcs.len() - 1;
        &mut self.funcs[last]
    }

    fn open_function(&mut self, is_vararg: bool) {
        self.funcs.push(FuncState {
            scopes: vec![Scope::default()],
            is_vararg,
            ..FuncState::default()
        });
    }

    fn close_function(
        &mut self,
        name: String,
        line: usize,
        params: Vec<usize>,
        body: Block,
    ) -> Rc<FunctionProto> {
        let fs = self.funcs.pop().unwrap_or_default();
        Rc::new(FunctionProto {
            name,
            chunk: self.chunk.clone(),
            line,
            params,
            is_vararg: fs.is_vararg,
            num_slots: fs.local_names.len(),
            local_names: fs.local_names,
            upvalues: fs.upvalues,
            upvalue_names: fs.upvalue_names,
            body,
        })
    }

    fn open_scope(&mut self) {
        self.fs().scopes.push(Scope::default());
    }

    fn close_scope(&mut self) {
        self.fs().scopes.pop();
    }

    /// Allocate a fresh slot and bring the name into scope.
    fn declare_local(&mut self, name: Rc<str>, attrib: Attrib) -> usize {
        let fs = self.fs();
        let slot = fs.local_names.len();
        fs.local_names.push(name.clone());
        fs.slot_attribs.push(attrib);
        if let Some(scope) = fs.scopes.last_mut() {
            scope.vars.push((name, slot, attrib));
        }
        slot
    }

    fn resolve(&mut self, level: usize, name: &Rc<str>) -> Resolved {
        let fs = &self.funcs[level];
        for scope in fs.scopes.iter().rev() {
            if let Some((_, slot, attrib)) = scope.vars.iter().rev().find(|(n, _, _)| n == name) {
                return Resolved::Local(*slot, *attrib);
            }
        }
        if let Some(i) = fs.upvalue_names.iter().position(|n| n == name) {
            return Resolved::Upvalue(i, fs.upvalue_attribs[i]);
        }
        if level == 0 {
            return Resolved::Global;
        }
        let (desc, attrib) = match self.resolve(level - 1, name) {
            Resolved::Local(slot, attrib) => (UpvalueDesc::Local(slot), attrib),
            Resolved::Upvalue(i, attrib) => (UpvalueDesc::Upvalue(i), attrib),
            Resolved::Global => return Resolved::Global,
        };
        let fs = &mut self.funcs[level];
        fs.upvalues.push(desc);
        fs.upvalue_names.push(name.clone());
        fs.upvalue_attribs.push(attrib);
        Resolved::Upvalue(fs.upvalues.len() - 1, attrib)
    }

    fn single_var(&mut self, name: Rc<str>) -> Expr {
        let level = self.funcs.len() - 1;
        match self.resolve(level, &name) {
            Resolved::Local(slot, _) => Expr::Local(slot),
            Resolved::Upvalue(i, _) => Expr::Upvalue(i),
            Resolved::Global => Expr::Global(name),
        }
    }

    /// Reject assignment to `<const>` and `<close>` variables.
    fn check_assignable(&self, target: &Expr) -> LResult<()> {
        let fs = &self.funcs[self.funcs.len() - 1];
        let (attrib, name) = match target {
            Expr::Local(slot) => (fs.slot_attribs[*slot], fs.local_names[*slot].clone()),
            Expr::Upvalue(i) => (fs.upvalue_attribs[*i], fs.upvalue_names[*i].clone()),
            Expr::Global(_) | Expr::Index(..) => return Ok(()),
            _ => return Err(self.error_near("syntax error")),
        };
        if attrib == Attrib::None {
            Ok(())
        } else {
            Err(self.error(format!("attempt to assign to const variable '{}'", name)))
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block_follow(&self) -> bool {
        matches!(
            self.peek(),
            Token::Eof | Token::End | Token::Else | Token::Elseif | Token::Until
        )
    }

    /// A block in its own scope.
    fn block(&mut self) -> LResult<Block> {
        self.open_scope();
        let block = self.block_body();
        self.close_scope();
        block
    }

    /// Statements of the current scope, up to a block terminator.
    fn block_body(&mut self) -> LResult<Block> {
        let mut block = Block::default();
        while !self.block_follow() {
            if self.check(&Token::Return) {
                block.stats.push(self.return_stat()?);
                break;
            }
            if let Some(stat) = self.statement(&mut block)? {
                block.stats.push(stat);
            }
        }
        Ok(block)
    }

    fn loop_body(&mut self) -> LResult<Block> {
        self.fs().loop_depth += 1;
        let body = self.block();
        self.fs().loop_depth -= 1;
        body
    }

    fn statement(&mut self, block: &mut Block) -> LResult<Option<Stat>> {
        let line = self.line();
        let kind = match self.peek() {
            Token::Semicolon => {
                self.advance();
                return Ok(None);
            }
            Token::If => self.if_stat(line)?,
            Token::While => {
                self.advance();
                let cond = self.expr()?;
                self.expect(Token::Do)?;
                let body = self.loop_body()?;
                self.expect_match(Token::End, Token::While, line)?;
                StatKind::While { cond, body }
            }
            Token::Do => {
                self.advance();
                let body = self.block()?;
                self.expect_match(Token::End, Token::Do, line)?;
                StatKind::Do(body)
            }
            Token::For => self.for_stat(line)?,
            Token::Repeat => {
                self.advance();
                self.fs().loop_depth += 1;
                self.open_scope();
                let body = self.block_body();
                self.fs().loop_depth -= 1;
                let body = body?;
                self.expect_match(Token::Until, Token::Repeat, line)?;
                let cond = self.expr();
                self.close_scope();
                StatKind::Repeat { body, cond: cond? }
            }
            Token::Function => self.function_stat(line)?,
            Token::Local => {
                self.advance();
                if self.accept(&Token::Function) {
                    let name = self.expect_name()?;
                    let slot = self.declare_local(name.clone(), Attrib::None);
                    let func = self.function_body(name.to_string(), false, line)?;
                    StatKind::LocalFunction { slot, func }
                } else {
                    self.local_stat(block)?
                }
            }
            Token::Break => {
                self.advance();
                if self.fs().loop_depth == 0 {
                    return Err(self.error(format!("break outside a loop at line {}", line)));
                }
                StatKind::Break
            }
            _ => self.expr_stat()?,
        };
        Ok(Some(Stat { kind, line }))
    }

    fn return_stat(&mut self) -> LResult<Stat> {
        let line = self.line();
        self.advance();
        let exprs = if self.block_follow() || self.check(&Token::Semicolon) {
            Vec::new()
        } else {
            self.expr_list()?
        };
        self.accept(&Token::Semicolon);
        Ok(Stat {
            kind: StatKind::Return(exprs),
            line,
        })
    }

    fn if_stat(&mut self, line: usize) -> LResult<StatKind> {
        let mut branches = Vec::new();
        let mut otherwise = None;
        self.advance();
        loop {
            let cond = self.expr()?;
            self.expect(Token::Then)?;
            let body = self.block()?;
            branches.push((cond, body));
            if self.accept(&Token::Elseif) {
                continue;
            }
            if self.accept(&Token::Else) {
                otherwise = Some(self.block()?);
            }
            self.expect_match(Token::End, Token::If, line)?;
            return Ok(StatKind::If {
                branches,
                otherwise,
            });
        }
    }

    fn for_stat(&mut self, line: usize) -> LResult<StatKind> {
        self.advance();
        let first = self.expect_name()?;
        if self.accept(&Token::Assign) {
            let start = self.expr()?;
            self.expect(Token::Comma)?;
            let limit = self.expr()?;
            let step = if self.accept(&Token::Comma) {
                Some(self.expr()?)
            } else {
                None
            };
            self.expect(Token::Do)?;
            self.open_scope();
            let var = self.declare_local(first, Attrib::None);
            let body = self.loop_body();
            self.close_scope();
            self.expect_match(Token::End, Token::For, line)?;
            return Ok(StatKind::NumericFor {
                var,
                start,
                limit,
                step,
                body: body?,
            });
        }

        let mut names = vec![first];
        while self.accept(&Token::Comma) {
            names.push(self.expect_name()?);
        }
        self.expect(Token::In)?;
        let exprs = self.expr_list()?;
        self.expect(Token::Do)?;
        self.open_scope();
        let vars = names
            .into_iter()
            .map(|name| self.declare_local(name, Attrib::None))
            .collect();
        let body = self.loop_body();
        self.close_scope();
        self.expect_match(Token::End, Token::For, line)?;
        Ok(StatKind::GenericFor {
            vars,
            exprs,
            body: body?,
        })
    }

    fn function_stat(&mut self, line: usize) -> LResult<StatKind> {
        self.advance();
        let name = self.expect_name()?;
        let mut full_name = name.to_string();
        let mut target = self.single_var(name);
        let mut is_method = false;
        while self.check(&Token::Dot) || self.check(&Token::Colon) {
            is_method = self.advance() == Token::Colon;
            let key = self.expect_name()?;
            full_name.push(if is_method { ':' } else { '.' });
            full_name.push_str(&key);
            target = Expr::Index(Box::new(target), Box::new(Expr::Str(key)));
            if is_method {
                break;
            }
        }
        self.check_assignable(&target)?;
        let func = self.function_body(full_name, is_method, line)?;
        Ok(StatKind::Assign {
            targets: vec![target],
            exprs: vec![Expr::Function(func)],
        })
    }

    fn local_stat(&mut self, block: &mut Block) -> LResult<StatKind> {
        let mut decls = Vec::new();
        loop {
            let name = self.expect_name()?;
            let attrib = if self.accept(&Token::Lt) {
                let attr = self.expect_name()?;
                self.expect(Token::Gt)?;
                match &*attr {
                    "const" => Attrib::Const,
                    "close" => Attrib::Close,
                    other => return Err(self.error(format!("unknown attribute '{}'", other))),
                }
            } else {
                Attrib::None
            };
            decls.push((name, attrib));
            if !self.accept(&Token::Comma) {
                break;
            }
        }
        if decls.iter().filter(|(_, a)| *a == Attrib::Close).count() > 1 {
            return Err(self.error("multiple to-be-closed variables in local list"));
        }
        let exprs = if self.accept(&Token::Assign) {
            self.expr_list()?
        } else {
            Vec::new()
        };
        // Names come into scope only after the initializers
        let targets = decls
            .into_iter()
            .map(|(name, attrib)| {
                if attrib == Attrib::Close {
                    block.has_close = true;
                }
                LocalTarget {
                    slot: self.declare_local(name, attrib),
                    attrib,
                }
            })
            .collect();
        Ok(StatKind::Local { targets, exprs })
    }

    fn expr_stat(&mut self) -> LResult<StatKind> {
        let first = self.suffixed_expr()?;
        if self.check(&Token::Assign) || self.check(&Token::Comma) {
            let mut targets = vec![first];
            while self.accept(&Token::Comma) {
                targets.push(self.suffixed_expr()?);
            }
            self.expect(Token::Assign)?;
            let exprs = self.expr_list()?;
            for target in &targets {
                self.check_assignable(target)?;
            }
            return Ok(StatKind::Assign { targets, exprs });
        }
        match first {
            Expr::Call(..) | Expr::Method(..) => Ok(StatKind::Expr(first)),
            _ => Err(self.error_near("syntax error")),
        }
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    fn function_body(
        &mut self,
        name: String,
        is_method: bool,
        line: usize,
    ) -> LResult<Rc<FunctionProto>> {
        self.open_function(false);
        let mut params = Vec::new();
        if is_method {
            params.push(self.declare_local(Rc::from("self"), Attrib::None));
        }
        match self.function_rest(&mut params, line) {
            Ok(body) => Ok(self.close_function(name, line, params, body)),
            Err(err) => {
                self.funcs.pop();
                Err(err)
            }
        }
    }

    fn function_rest(&mut self, params: &mut Vec<usize>, line: usize) -> LResult<Block> {
        self.expect(Token::LeftParen)?;
        if !self.check(&Token::RightParen) {
            loop {
                match self.peek() {
                    Token::Name(_) => {
                        let name = self.expect_name()?;
                        params.push(self.declare_local(name, Attrib::None));
                    }
                    Token::Dots => {
                        self.advance();
                        self.fs().is_vararg = true;
                        break;
                    }
                    _ => return Err(self.error_near("<name> expected")),
                }
                if !self.accept(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RightParen)?;
        let body = self.block_body()?;
        self.expect_match(Token::End, Token::Function, line)?;
        Ok(body)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr_list(&mut self) -> LResult<Vec<Expr>> {
        let mut exprs = vec![self.expr()?];
        while self.accept(&Token::Comma) {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    pub fn expr(&mut self) -> LResult<Expr> {
        self.sub_expr(0)
    }

    fn sub_expr(&mut self, limit: u8) -> LResult<Expr> {
        let mut left = match unary_op(self.peek()) {
            Some(op) => {
                self.advance();
                let operand = self.sub_expr(UNARY_PRIORITY)?;
                match (op, operand) {
                    (UnOp::Neg, Expr::Int(i)) => Expr::Int(i.wrapping_neg()),
                    (UnOp::Neg, Expr::Float(f)) => Expr::Float(-f),
                    (op, operand) => Expr::Unary(op, Box::new(operand)),
                }
            }
            None => self.simple_expr()?,
        };
        loop {
            let token = self.peek().clone();
            let right_power = match priority(&token) {
                Some((left_power, right_power)) if left_power > limit => right_power,
                _ => break,
            };
            self.advance();
            let right = self.sub_expr(right_power)?;
            left = combine(&token, left, right);
        }
        Ok(left)
    }

    fn simple_expr(&mut self) -> LResult<Expr> {
        let expr = match self.peek().clone() {
            Token::Integer(i) => Expr::Int(i),
            Token::Float(f) => Expr::Float(f),
            Token::String(s) => Expr::Str(s),
            Token::Nil => Expr::Nil,
            Token::True => Expr::True,
            Token::False => Expr::False,
            Token::Dots => {
                if !self.fs().is_vararg {
                    return Err(self.error_near("cannot use '...' outside a vararg function"));
                }
                Expr::Vararg
            }
            Token::LeftBrace => return self.table_constructor(),
            Token::Function => {
                let line = self.line();
                self.advance();
                return Ok(Expr::Function(self.function_body(
                    "anonymous".to_string(),
                    false,
                    line,
                )?));
            }
            _ => return self.suffixed_expr(),
        };
        self.advance();
        Ok(expr)
    }

    fn primary_expr(&mut self) -> LResult<Expr> {
        match self.peek().clone() {
            Token::Name(name) => {
                self.advance();
                Ok(self.single_var(name))
            }
            Token::LeftParen => {
                let line = self.line();
                self.advance();
                let inner = self.expr()?;
                self.expect_match(Token::RightParen, Token::LeftParen, line)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            _ => Err(self.error_near("unexpected symbol")),
        }
    }

    fn suffixed_expr(&mut self) -> LResult<Expr> {
        let mut expr = self.primary_expr()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let key = self.expect_name()?;
                    expr = Expr::Index(Box::new(expr), Box::new(Expr::Str(key)));
                }
                Token::LeftBracket => {
                    self.advance();
                    let key = self.expr()?;
                    self.expect(Token::RightBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(key));
                }
                Token::Colon => {
                    self.advance();
                    let name = self.expect_name()?;
                    let args = self.call_args()?;
                    expr = Expr::Method(Box::new(expr), name, args);
                }
                Token::LeftParen | Token::String(_) | Token::LeftBrace => {
                    let args = self.call_args()?;
                    expr = Expr::Call(Box::new(expr), args);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn call_args(&mut self) -> LResult<Vec<Expr>> {
        match self.peek().clone() {
            Token::String(s) => {
                self.advance();
                Ok(vec![Expr::Str(s)])
            }
            Token::LeftBrace => Ok(vec![self.table_constructor()?]),
            Token::LeftParen => {
                let line = self.line();
                self.advance();
                if self.accept(&Token::RightParen) {
                    return Ok(Vec::new());
                }
                let args = self.expr_list()?;
                self.expect_match(Token::RightParen, Token::LeftParen, line)?;
                Ok(args)
            }
            _ => Err(self.error_near("function arguments expected")),
        }
    }

    fn table_constructor(&mut self) -> LResult<Expr> {
        let line = self.line();
        self.expect(Token::LeftBrace)?;
        let mut fields = Vec::new();
        while !self.check(&Token::RightBrace) {
            let field = match self.peek() {
                Token::LeftBracket => {
                    self.advance();
                    let key = self.expr()?;
                    self.expect(Token::RightBracket)?;
                    self.expect(Token::Assign)?;
                    Field::Keyed(key, self.expr()?)
                }
                Token::Name(_) if self.peek_at(1) == &Token::Assign => {
                    let name = self.expect_name()?;
                    self.advance();
                    Field::Named(name, self.expr()?)
                }
                _ => Field::Positional(self.expr()?),
            };
            fields.push(field);
            if !self.accept(&Token::Comma) && !self.accept(&Token::Semicolon) {
                break;
            }
        }
        self.expect_match(Token::RightBrace, Token::LeftBrace, line)?;
        Ok(Expr::Table(fields))
    }
}
