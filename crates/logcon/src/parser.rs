//! Parser - recursive-descent parser over the `Token` stream (spec
//! §4.9).
//!
//! Grounded on `Core/Parser.cpp`: statements are terminated by a
//! newline, a semicolon, or the closing brace of their enclosing
//! block; a parse error records "line L, column C: message" and the
//! parser resynchronizes to the next statement boundary rather than
//! aborting, so one bad statement doesn't hide every error after it.
//! Multi-word function names (`move up(...)`, `движение вверх(...)`)
//! are recognized by greedily concatenating consecutive identifier
//! tokens before the call's opening paren, since LogCon's direction
//! words are ordinary identifiers, not a distinct token kind.

use crate::ast::{
    AssignmentTarget, BinaryOp, DeclarationScope, EventBlock, EventKind, Expression, FunctionDef,
    Script, Statement, UnaryOp,
};
use crate::ast::Entity;
use crate::token::{Token, TokenId};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.message)
    }
}

pub struct ParseResult {
    pub script: Script,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, errors: Vec::new() }
    }

    pub fn parse(mut self) -> ParseResult {
        let mut entities = Vec::new();
        self.skip_separators();
        while !self.is_at_end() {
            if self.check(TokenId::Entity) {
                match self.parse_entity() {
                    Ok(entity) => entities.push(entity),
                    Err(()) => self.synchronize_to_entity(),
                }
            } else {
                let token = self.peek().clone();
                self.error(&token, "expected 'entity' declaration");
                self.advance();
            }
            self.skip_separators();
        }

        ParseResult { script: Script { entities }, errors: self.errors }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(ParseError { line: token.line, column: token.column, message: message.to_string() });
    }

    fn synchronize_to_entity(&mut self) {
        while !self.is_at_end() && !self.check(TokenId::Entity) {
            self.advance();
        }
    }

    // --- token stream helpers -------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().id == TokenId::EndOfFile
    }

    fn check(&self, id: TokenId) -> bool {
        self.peek().id == id
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn match_id(&mut self, id: TokenId) -> bool {
        if self.check(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, id: TokenId, message: &str) -> Result<Token, ()> {
        if self.check(id) {
            Ok(self.advance())
        } else {
            let token = self.peek().clone();
            self.error(&token, message);
            Err(())
        }
    }

    fn skip_separators(&mut self) {
        while self.check(TokenId::Newline) || self.check(TokenId::Semicolon) {
            self.advance();
        }
    }

    fn end_statement(&mut self) {
        if self.check(TokenId::RightBrace) || self.is_at_end() {
            return;
        }
        if self.check(TokenId::Newline) || self.check(TokenId::Semicolon) {
            self.skip_separators();
        }
    }

    // --- entity / block structure ----------------------------------------------

    fn parse_entity(&mut self) -> Result<Entity, ()> {
        self.expect(TokenId::Entity, "expected 'entity'")?;
        let name_token = self.expect(TokenId::Ident, "expected entity name")?;
        self.skip_separators();
        self.expect(TokenId::LeftBrace, "expected '{' after entity name")?;
        self.skip_separators();

        let mut entity = Entity::new(name_token.lexeme);
        while !self.check(TokenId::RightBrace) && !self.is_at_end() {
            if self.check(TokenId::On) {
                match self.parse_event_block() {
                    Ok(event) => entity.events.push(event),
                    Err(()) => self.synchronize_statement(),
                }
            } else if self.check(TokenId::Function) {
                match self.parse_function_def() {
                    Ok(func) => entity.functions.push(func),
                    Err(()) => self.synchronize_statement(),
                }
            } else {
                match self.parse_statement() {
                    Ok(stmt) => entity.properties.push(stmt),
                    Err(()) => self.synchronize_statement(),
                }
            }
            self.skip_separators();
        }

        self.expect(TokenId::RightBrace, "expected '}' to close entity body")?;
        Ok(entity)
    }

    fn synchronize_statement(&mut self) {
        while !self.is_at_end() && !self.check(TokenId::Newline) && !self.check(TokenId::Semicolon)
            && !self.check(TokenId::RightBrace)
        {
            self.advance();
        }
        self.skip_separators();
    }

    fn parse_event_block(&mut self) -> Result<EventBlock, ()> {
        self.expect(TokenId::On, "expected 'on'")?;
        let name_token = self.expect(TokenId::Ident, "expected event name after 'on'")?;
        let kind = match name_token.lexeme.to_lowercase().as_str() {
            "create" => EventKind::Create,
            "update" => EventKind::Update,
            "destroy" => EventKind::Destroy,
            "collision" => EventKind::Collision,
            "keypress" => EventKind::KeyPress,
            other => EventKind::Custom(other.to_string()),
        };

        let param = if self.match_id(TokenId::LeftParen) {
            let param = if self.check(TokenId::Ident) {
                Some(self.advance().lexeme)
            } else {
                None
            };
            self.expect(TokenId::RightParen, "expected ')' after event parameter")?;
            param
        } else {
            None
        };

        self.skip_separators();
        let statements = self.parse_block()?;
        Ok(EventBlock { kind, param, statements })
    }

    fn parse_function_def(&mut self) -> Result<FunctionDef, ()> {
        self.expect(TokenId::Function, "expected 'function'")?;
        let name = self.expect(TokenId::Ident, "expected function name")?.lexeme;
        self.expect(TokenId::LeftParen, "expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenId::RightParen) {
            loop {
                params.push(self.expect(TokenId::Ident, "expected parameter name")?.lexeme);
                if !self.match_id(TokenId::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenId::RightParen, "expected ')' after parameters")?;
        self.skip_separators();
        let body = self.parse_block()?;
        Ok(FunctionDef { name, params, body })
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, ()> {
        self.expect(TokenId::LeftBrace, "expected '{'")?;
        self.skip_separators();
        let mut statements = Vec::new();
        while !self.check(TokenId::RightBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize_statement(),
            }
            self.skip_separators();
        }
        self.expect(TokenId::RightBrace, "expected '}' to close block")?;
        Ok(statements)
    }

    // --- statements --------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Statement, ()> {
        let stmt = match self.peek().id {
            TokenId::LeftBrace => Statement::Block(self.parse_block()?),
            TokenId::If => self.parse_if()?,
            TokenId::While => self.parse_while()?,
            TokenId::For => self.parse_for()?,
            TokenId::Return => self.parse_return()?,
            TokenId::Break => {
                self.advance();
                Statement::Break
            }
            TokenId::Continue => {
                self.advance();
                Statement::Continue
            }
            TokenId::Var | TokenId::Let | TokenId::Global | TokenId::Const => self.parse_var_decl()?,
            TokenId::Trigger | TokenId::Emit => self.parse_trigger()?,
            TokenId::Function => Statement::FunctionDefinition(self.parse_function_def()?),
            _ => self.parse_expression_statement()?,
        };
        self.end_statement();
        Ok(stmt)
    }

    fn parse_if(&mut self) -> Result<Statement, ()> {
        self.expect(TokenId::If, "expected 'if'")?;
        let condition = self.parse_expression()?;
        self.skip_separators();
        let then_branch = self.parse_block()?;
        self.skip_separators();
        let else_branch = if self.match_id(TokenId::Else) {
            self.skip_separators();
            if self.check(TokenId::If) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Statement::If { condition, then_branch, else_branch })
    }

    fn parse_while(&mut self) -> Result<Statement, ()> {
        self.expect(TokenId::While, "expected 'while'")?;
        let condition = self.parse_expression()?;
        self.skip_separators();
        let body = self.parse_block()?;
        Ok(Statement::While { condition, body })
    }

    /// `for IDENT = expr expr block`. Deliberately ambiguous: there is
    /// no `to`/`step` keyword, so the loop bound and the (implicit,
    /// always-1) step are just two expressions back to back.
    fn parse_for(&mut self) -> Result<Statement, ()> {
        self.expect(TokenId::For, "expected 'for'")?;
        let variable = self.expect(TokenId::Ident, "expected loop variable")?.lexeme;
        self.expect(TokenId::Equal, "expected '=' after loop variable")?;
        let start = self.parse_expression()?;
        let end = self.parse_expression()?;
        self.skip_separators();
        let body = self.parse_block()?;
        Ok(Statement::For { variable, start, end, body })
    }

    fn parse_return(&mut self) -> Result<Statement, ()> {
        self.expect(TokenId::Return, "expected 'return'")?;
        if self.check(TokenId::Newline) || self.check(TokenId::Semicolon) || self.check(TokenId::RightBrace) {
            return Ok(Statement::Return(None));
        }
        Ok(Statement::Return(Some(self.parse_expression()?)))
    }

    fn parse_var_decl(&mut self) -> Result<Statement, ()> {
        let scope = match self.advance().id {
            TokenId::Global => DeclarationScope::Global,
            TokenId::Const => DeclarationScope::Constant,
            _ => DeclarationScope::Local,
        };
        let name = self.expect(TokenId::Ident, "expected variable name")?.lexeme;
        let value = if self.match_id(TokenId::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Statement::VariableDeclaration { scope, name, value })
    }

    fn parse_trigger(&mut self) -> Result<Statement, ()> {
        self.advance();
        let name = self.expect(TokenId::Ident, "expected event name")?.lexeme;
        let args = if self.match_id(TokenId::LeftParen) {
            let args = self.parse_arguments()?;
            self.expect(TokenId::RightParen, "expected ')' after trigger arguments")?;
            args
        } else {
            Vec::new()
        };
        Ok(Statement::TriggerEvent { name, args })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ()> {
        let expr = self.parse_expression()?;
        if self.match_id(TokenId::Equal) {
            let target = match expr {
                Expression::Identifier(name) => AssignmentTarget::Identifier(name),
                Expression::ArrayAccess { object, index } => {
                    let object_name = match *object {
                        Expression::Identifier(name) => name,
                        _ => {
                            let token = self.previous().clone();
                            self.error(&token, "invalid assignment target");
                            return Err(());
                        }
                    };
                    AssignmentTarget::Index { object: object_name, index }
                }
                _ => {
                    let token = self.previous().clone();
                    self.error(&token, "invalid assignment target");
                    return Err(());
                }
            };
            let value = self.parse_expression()?;
            return Ok(Statement::Assignment { target, value });
        }

        if matches!(expr, Expression::Call { .. }) {
            return Ok(Statement::FunctionCall(expr));
        }

        Ok(Statement::FunctionCall(expr))
    }

    // --- expressions ---------------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expression, ()> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression, ()> {
        let mut left = self.parse_and()?;
        while self.match_id(TokenId::Or) {
            let right = self.parse_and()?;
            left = Expression::Binary { left: Box::new(left), op: BinaryOp::Or, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ()> {
        let mut left = self.parse_equality()?;
        while self.match_id(TokenId::And) {
            let right = self.parse_equality()?;
            left = Expression::Binary { left: Box::new(left), op: BinaryOp::And, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, ()> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = if self.match_id(TokenId::EqualEqual) {
                BinaryOp::EqualEqual
            } else if self.match_id(TokenId::BangEqual) {
                BinaryOp::BangEqual
            } else {
                break;
            };
            let right = self.parse_comparison()?;
            left = Expression::Binary { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression, ()> {
        let mut left = self.parse_additive()?;
        loop {
            let op = if self.match_id(TokenId::Greater) {
                BinaryOp::Greater
            } else if self.match_id(TokenId::GreaterEqual) {
                BinaryOp::GreaterEqual
            } else if self.match_id(TokenId::Less) {
                BinaryOp::Less
            } else if self.match_id(TokenId::LessEqual) {
                BinaryOp::LessEqual
            } else {
                break;
            };
            let right = self.parse_additive()?;
            left = Expression::Binary { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, ()> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.match_id(TokenId::Plus) {
                BinaryOp::Plus
            } else if self.match_id(TokenId::Minus) {
                BinaryOp::Minus
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            left = Expression::Binary { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ()> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.match_id(TokenId::Star) {
                BinaryOp::Star
            } else if self.match_id(TokenId::Slash) {
                BinaryOp::Slash
            } else if self.match_id(TokenId::Percent) {
                BinaryOp::Percent
            } else {
                break;
            };
            let right = self.parse_unary()?;
            left = Expression::Binary { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ()> {
        if self.match_id(TokenId::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary { op: UnaryOp::Minus, operand: Box::new(operand) });
        }
        if self.match_id(TokenId::Bang) || self.match_id(TokenId::Not) {
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary { op: UnaryOp::Not, operand: Box::new(operand) });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, ()> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.match_id(TokenId::LeftBracket) {
                let index = self.parse_expression()?;
                self.expect(TokenId::RightBracket, "expected ']' after index")?;
                expr = Expression::ArrayAccess { object: Box::new(expr), index: Box::new(index) };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, ()> {
        if self.check(TokenId::Number) {
            let token = self.advance();
            return Ok(Expression::NumberLiteral(token.number_value));
        }
        if self.check(TokenId::String) {
            let token = self.advance();
            return Ok(Expression::StringLiteral(token.string_value));
        }
        if self.check(TokenId::BoolLiteral) {
            let token = self.advance();
            return Ok(Expression::BooleanLiteral(token.bool_value));
        }
        if self.match_id(TokenId::LeftParen) {
            let expr = self.parse_expression()?;
            self.expect(TokenId::RightParen, "expected ')' after expression")?;
            return Ok(expr);
        }
        if self.match_id(TokenId::LeftBracket) {
            let mut items = Vec::new();
            if !self.check(TokenId::RightBracket) {
                loop {
                    items.push(self.parse_expression()?);
                    if !self.match_id(TokenId::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenId::RightBracket, "expected ']' to close array literal")?;
            return Ok(Expression::ArrayLiteral(items));
        }
        if self.check(TokenId::Ident) {
            return self.parse_identifier_or_call();
        }

        let token = self.peek().clone();
        self.error(&token, "expected an expression");
        Err(())
    }

    /// Greedily concatenates consecutive identifier tokens into one
    /// call/identifier name,
    /// stopping as soon as something other than `LeftParen` follows a
    /// single identifier, or as soon as the run of identifiers ends.
    fn parse_identifier_or_call(&mut self) -> Result<Expression, ()> {
        let mut name = self.advance().lexeme;

        while self.check(TokenId::Ident) && self.check_next_is_ident_run() {
            name.push_str(&self.advance().lexeme);
        }

        if self.match_id(TokenId::LeftParen) {
            let args = self.parse_arguments()?;
            self.expect(TokenId::RightParen, "expected ')' after call arguments")?;
            return Ok(Expression::Call { name: normalize_call_name(&name), args });
        }

        Ok(Expression::Identifier(name))
    }

    /// True only when concatenating the next identifier still leads to
    /// a call (i.e. there is a `(` somewhere before the next statement
    /// boundary along this identifier run). Keeps a bare multi-word
    /// phrase that never calls anything from being merged into one
    /// malformed identifier.
    fn check_next_is_ident_run(&self) -> bool {
        let mut i = self.pos;
        while let Some(token) = self.tokens.get(i) {
            match token.id {
                TokenId::Ident => i += 1,
                TokenId::LeftParen => return true,
                _ => return false,
            }
        }
        false
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ()> {
        let mut args = Vec::new();
        if self.check(TokenId::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.match_id(TokenId::Comma) {
                break;
            }
        }
        Ok(args)
    }
}

fn normalize_call_name(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{register_builtin_languages, LanguageRegistry};
    use crate::lexer::Lexer;

    fn parse(source: &str) -> ParseResult {
        let mut registry = LanguageRegistry::new();
        register_builtin_languages(&mut registry);
        let lang = registry.get("en").unwrap();
        let tokens = Lexer::new(lang, source).tokenize();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_minimal_entity() {
        let result = parse("entity Hero {\nvar health = 100\n}");
        assert!(result.succeeded());
        assert_eq!(result.script.entities.len(), 1);
        assert_eq!(result.script.entities[0].name, "Hero");
    }

    #[test]
    fn parses_update_event_with_param() {
        let result = parse("entity Hero {\non Update(dt) {\nhealth = health - 1\n}\n}");
        assert!(result.succeeded(), "errors: {:?}", result.errors);
        let event = &result.script.entities[0].events[0];
        assert_eq!(event.kind, EventKind::Update);
        assert_eq!(event.param.as_deref(), Some("dt"));
    }

    #[test]
    fn parses_function_call_with_args() {
        let result = parse("entity Hero {\non Create {\nprint(\"hi\", 1)\n}\n}");
        assert!(result.succeeded(), "errors: {:?}", result.errors);
    }

    #[test]
    fn reports_error_with_line_and_column() {
        let result = parse("entity Hero {\nvar = \n}");
        assert!(!result.succeeded());
        assert!(result.errors[0].line >= 1);
    }

    #[test]
    fn parses_array_index_assignment() {
        let result = parse("entity Hero {\nvar xs = [1, 2, 3]\nxs[0] = 9\n}");
        assert!(result.succeeded(), "errors: {:?}", result.errors);
    }

    #[test]
    fn for_loop_takes_two_expressions_with_no_step_keyword() {
        let result = parse("entity Hero {\non Create {\nfor i = 0 10 {\nprint(i)\n}\n}\n}");
        assert!(result.succeeded(), "errors: {:?}", result.errors);
    }
}
