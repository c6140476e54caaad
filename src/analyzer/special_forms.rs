//! Analyzers for the forms the compiler gives meaning to directly. Each one
//! validates its shape first, then analyzes sub-forms in the environment the
//! form's semantics prescribe. Violations surface as `AnalyzerError` at the
//! offending sub-form's span; nothing is caught or repaired here.

use itertools::Itertools;

use super::{
    is_rest_marker, Analyzer, AnalyzerError, AnalyzerResult, CatchClause, ExecutionContext, Node,
    NodeEnvironment, NodeKind, RecurFrame,
};
use crate::error_reporting::SourceSpan;
use crate::form::{Form, FormKind, Symbol};

impl<'a> Analyzer<'a> {
    pub(crate) fn analyze_def(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        if !env.def_allowed() {
            return Err(AnalyzerError::NestedDefForbidden {
                form: "def".to_string(),
                span: form.span.clone(),
            });
        }

        let (name_form, meta, init_form) = match args {
            [name, init] => (name, None, init),
            [name, meta, init] => (name, Some(meta.clone()), init),
            _ => {
                return Err(malformed(
                    form,
                    "def",
                    "expected a name, optional metadata, and an init expression",
                ))
            }
        };
        let name = plain_symbol(name_form, "def", "expected the name to be an unqualified symbol")?;

        // The init is an expression and may not define further globals.
        let init_env = env
            .with_context(ExecutionContext::Expression)
            .with_def_allowed(false);
        let init = self.analyze(init_form, &init_env)?;

        Ok(Node::new(
            NodeKind::Def {
                name,
                meta,
                init: Box::new(init),
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_ns(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        if !env.def_allowed() {
            return Err(AnalyzerError::NestedDefForbidden {
                form: "ns".to_string(),
                span: form.span.clone(),
            });
        }

        let (name_form, clauses) = args
            .split_first()
            .ok_or_else(|| malformed(form, "ns", "expected a namespace name"))?;
        let name = plain_symbol(
            name_form,
            "ns",
            "expected the namespace name to be an unqualified symbol",
        )?;

        // Switch first so required aliases land in the new namespace.
        self.registry().set_current_namespace(&name.name);

        let mut requires = Vec::new();
        for clause in clauses {
            let items = clause
                .as_list()
                .ok_or_else(|| malformed(clause, "ns", "expected a (:require ...) clause"))?;
            match items {
                [kw, target] if is_keyword(kw, "require") => {
                    let target = plain_symbol(
                        target,
                        "ns",
                        "expected the required namespace to be a symbol",
                    )?;
                    self.registry().require_namespace(&target.name);
                    requires.push(target);
                }
                [kw, target, as_kw, alias]
                    if is_keyword(kw, "require") && is_keyword(as_kw, "as") =>
                {
                    let target = plain_symbol(
                        target,
                        "ns",
                        "expected the required namespace to be a symbol",
                    )?;
                    let alias =
                        plain_symbol(alias, "ns", "expected the alias to be a plain symbol")?;
                    self.registry().require_namespace(&target.name);
                    self.registry().define_alias(&alias.name, &target.name);
                    requires.push(target);
                }
                _ => {
                    return Err(malformed(
                        clause,
                        "ns",
                        "expected (:require ns) or (:require ns :as alias)",
                    ))
                }
            }
        }

        Ok(Node::new(
            NodeKind::Ns { name, requires },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_fn(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        let (params_form, body_forms) = args
            .split_first()
            .ok_or_else(|| malformed(form, "fn", "expected a parameter vector"))?;
        let param_items = params_form
            .as_vector()
            .ok_or_else(|| malformed(params_form, "fn", "expected a parameter vector"))?;

        let mut body_env = env.clone();
        let mut params = Vec::new();
        let mut rest_param = None;

        let mut items = param_items.iter();
        while let Some(item) = items.next() {
            if is_rest_marker(item) {
                if let Some(rest_form) = items.next() {
                    let symbol = plain_symbol(
                        rest_form,
                        "fn",
                        "expected the rest parameter to be a plain symbol",
                    )?;
                    let (extended, bound) = self.bind_local(&body_env, &symbol);
                    body_env = extended;
                    rest_param = Some(bound);
                    if let Some(extra) = items.next() {
                        return Err(AnalyzerError::MultipleRestBindings {
                            span: extra.span.clone(),
                        });
                    }
                }
                break;
            }
            let symbol = plain_symbol(item, "fn", "expected parameters to be plain symbols")?;
            let (extended, bound) = self.bind_local(&body_env, &symbol);
            body_env = extended;
            params.push(bound);
        }

        // The rest parameter is a recur position like any other.
        let frame_id = self.next_frame_id();
        let mut frame_params = params.clone();
        if let Some(rest) = &rest_param {
            frame_params.push(rest.clone());
        }
        let body_env = body_env.push_recur_frame(RecurFrame::new(frame_id, frame_params));

        let body = self.analyze_body(body_forms, &body_env, ExecutionContext::Return, &form.span)?;

        Ok(Node::new(
            NodeKind::Fn {
                params,
                rest_param,
                body,
                frame_id,
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_do(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        let (stmts, ret) = match args.split_last() {
            None => (Vec::new(), self.nil_literal(env, &form.span)),
            Some((last, init)) => {
                let stmt_env = env.with_context(ExecutionContext::Statement);
                let stmts = init
                    .iter()
                    .map(|stmt| self.analyze(stmt, &stmt_env))
                    .collect::<AnalyzerResult<Vec<_>>>()?;
                // The final form keeps the caller's context, so a tail recur
                // inside `(do ...)` stays a tail recur.
                (stmts, self.analyze(last, env)?)
            }
        };

        Ok(Node::new(
            NodeKind::Do {
                stmts,
                ret: Box::new(ret),
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_if(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        let (test_form, then_form, else_form) = match args {
            [test, then] => (test, then, None),
            [test, then, els] => (test, then, Some(els)),
            _ => {
                return Err(malformed(
                    form,
                    "if",
                    "expected a test, a then branch, and an optional else branch",
                ))
            }
        };

        let test_env = env
            .with_context(ExecutionContext::Expression)
            .with_disallow_recur();
        let test = self.analyze(test_form, &test_env)?;

        // Branches keep the parent context and recursion permissions.
        let then_branch = self.analyze(then_form, env)?;
        let else_branch = match else_form {
            Some(els) => self.analyze(els, env)?,
            None => self.nil_literal(env, &form.span),
        };

        Ok(Node::new(
            NodeKind::If {
                test: Box::new(test),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_let(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
        is_loop: bool,
    ) -> AnalyzerResult<Node> {
        let form_name = if is_loop { "loop" } else { "let" };

        let (bindings_form, body_forms) = args
            .split_first()
            .ok_or_else(|| malformed(form, form_name, "expected a binding vector"))?;
        let binding_items = bindings_form
            .as_vector()
            .ok_or_else(|| malformed(bindings_form, form_name, "expected a binding vector"))?;
        if binding_items.len() % 2 != 0 {
            return Err(malformed(
                bindings_form,
                form_name,
                "expected an even number of binding forms",
            ));
        }

        let mut scope = env.clone();
        let mut bindings = Vec::new();
        let mut frame_params = Vec::new();

        for (pattern, value_form) in binding_items.iter().tuples() {
            let flat = self.deconstruct(pattern, value_form.clone())?;
            let mut pair_root = true;
            for (symbol, bound_form) in flat {
                // Each value sees the bindings accumulated so far but not
                // its own symbol; recur never hides in a binding value.
                let value_env = scope
                    .with_context(ExecutionContext::Expression)
                    .with_disallow_recur();
                let value = self.analyze(&bound_form, &value_env)?;

                let (extended, bound) = self.bind_local(&scope, &symbol);
                scope = extended;
                if pair_root {
                    // The first flattened symbol of a pair is the slot a
                    // recur argument feeds back into.
                    frame_params.push(bound.clone());
                    pair_root = false;
                }
                bindings.push((bound, value));
            }
        }

        let (frame_id, body_env) = if is_loop {
            let id = self.next_frame_id();
            (
                Some(id),
                scope.push_recur_frame(RecurFrame::new(id, frame_params)),
            )
        } else {
            (None, scope)
        };

        let body = self.analyze_body(body_forms, &body_env, env.context(), &form.span)?;

        Ok(Node::new(
            NodeKind::Let {
                bindings,
                body,
                is_loop,
                frame_id,
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_recur(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        if !env.recur_allowed() {
            return Err(AnalyzerError::IllegalRecur {
                message: "recur is not allowed in this position".to_string(),
                span: form.span.clone(),
            });
        }
        let frame = env
            .current_recur_frame()
            .ok_or_else(|| AnalyzerError::IllegalRecur {
                message: "no enclosing fn or loop to recur to".to_string(),
                span: form.span.clone(),
            })?;
        if args.len() != frame.arity() {
            return Err(AnalyzerError::RecurArityMismatch {
                expected: frame.arity(),
                found: args.len(),
                span: form.span.clone(),
            });
        }
        let frame_id = frame.id;

        let arg_env = env.with_context(ExecutionContext::Expression);
        let args = args
            .iter()
            .map(|arg| self.analyze(arg, &arg_env))
            .collect::<AnalyzerResult<Vec<_>>>()?;

        Ok(Node::new(
            NodeKind::Recur { frame_id, args },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_try(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        // A recur would jump out of the protected region.
        let base_env = env.with_disallow_recur();

        let body_end = args
            .iter()
            .position(|arg| clause_head(arg).is_some())
            .unwrap_or(args.len());
        let (body_forms, clause_forms) = args.split_at(body_end);

        let body = self.analyze_body(body_forms, &base_env, env.context(), &form.span)?;

        let mut catches = Vec::new();
        let mut finally = None;
        for clause in clause_forms {
            match clause_head(clause) {
                Some("catch") => {
                    if finally.is_some() {
                        return Err(malformed(
                            clause,
                            "try",
                            "expected finally to be the last clause",
                        ));
                    }
                    catches.push(self.analyze_catch_clause(clause, &base_env)?);
                }
                Some("finally") => {
                    if finally.is_some() {
                        return Err(malformed(
                            clause,
                            "try",
                            "expected at most one finally clause",
                        ));
                    }
                    finally = Some(self.analyze_finally_clause(clause, &base_env)?);
                }
                _ => {
                    return Err(malformed(
                        clause,
                        "try",
                        "expected only catch and finally clauses after the body",
                    ))
                }
            }
        }

        Ok(Node::new(
            NodeKind::Try {
                body,
                catches,
                finally,
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    fn analyze_catch_clause(
        &mut self,
        clause: &Form,
        env: &NodeEnvironment,
    ) -> AnalyzerResult<CatchClause> {
        let items = clause.as_list().ok_or_else(|| {
            malformed(clause, "try", "expected a (catch type binding body...) clause")
        })?;
        match items {
            [_, ty_form, binding_form, body_forms @ ..] => {
                let ty_env = env.with_context(ExecutionContext::Expression);
                let ty = self.analyze(ty_form, &ty_env)?;

                let symbol = plain_symbol(
                    binding_form,
                    "try",
                    "expected the catch binding to be a plain symbol",
                )?;
                let (clause_env, bound) = self.bind_local(env, &symbol);
                let body = self.analyze_body(body_forms, &clause_env, env.context(), &clause.span)?;

                Ok(CatchClause {
                    ty,
                    binding: bound,
                    body,
                })
            }
            _ => Err(malformed(
                clause,
                "try",
                "expected a (catch type binding body...) clause",
            )),
        }
    }

    fn analyze_finally_clause(
        &mut self,
        clause: &Form,
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Vec<Node>> {
        let items = clause
            .as_list()
            .ok_or_else(|| malformed(clause, "try", "expected a (finally body...) clause"))?;

        // A finally clause runs for effect only; it never produces the value.
        let stmt_env = env.with_context(ExecutionContext::Statement);
        items[1..]
            .iter()
            .map(|stmt| self.analyze(stmt, &stmt_env))
            .collect()
    }

    pub(crate) fn analyze_throw(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        match args {
            [expr] => {
                let expr_env = env
                    .with_context(ExecutionContext::Expression)
                    .with_disallow_recur();
                let expr = self.analyze(expr, &expr_env)?;
                Ok(Node::new(
                    NodeKind::Throw {
                        expr: Box::new(expr),
                    },
                    env.clone(),
                    form.span.clone(),
                ))
            }
            _ => Err(malformed(form, "throw", "expected exactly one expression")),
        }
    }

    pub(crate) fn analyze_foreach(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        let (binding_form, body_forms) = args
            .split_first()
            .ok_or_else(|| malformed(form, "foreach", "expected a binding vector"))?;
        let items = binding_form
            .as_vector()
            .ok_or_else(|| malformed(binding_form, "foreach", "expected a binding vector"))?;

        let (key_form, value_form, iterable_form) = match items {
            [value, iterable] => (None, value, iterable),
            [key, value, iterable] => (Some(key), value, iterable),
            _ => {
                return Err(malformed(
                    binding_form,
                    "foreach",
                    "expected [value coll] or [key value coll]",
                ))
            }
        };

        let iter_env = env.with_context(ExecutionContext::Expression);
        let iterable = self.analyze(iterable_form, &iter_env)?;

        let mut body_env = env.clone();
        let key = match key_form {
            Some(key_form) => {
                let symbol = plain_symbol(
                    key_form,
                    "foreach",
                    "expected the key binding to be a plain symbol",
                )?;
                let (extended, bound) = self.bind_local(&body_env, &symbol);
                body_env = extended;
                Some(bound)
            }
            None => None,
        };
        let value_symbol = plain_symbol(
            value_form,
            "foreach",
            "expected the value binding to be a plain symbol",
        )?;
        let (body_env, value) = self.bind_local(&body_env, &value_symbol);

        let stmt_env = body_env.with_context(ExecutionContext::Statement);
        let body = body_forms
            .iter()
            .map(|stmt| self.analyze(stmt, &stmt_env))
            .collect::<AnalyzerResult<Vec<_>>>()?;

        Ok(Node::new(
            NodeKind::Foreach {
                key,
                value,
                iterable: Box::new(iterable),
                body,
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_apply(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        if args.len() < 2 {
            return Err(malformed(
                form,
                "apply",
                "expected a function and a trailing sequence argument",
            ));
        }

        let arg_env = env.with_context(ExecutionContext::Expression);
        let callee = self.analyze(&args[0], &arg_env)?;
        let spread = self.analyze(&args[args.len() - 1], &arg_env)?;
        let mid = args[1..args.len() - 1]
            .iter()
            .map(|arg| self.analyze(arg, &arg_env))
            .collect::<AnalyzerResult<Vec<_>>>()?;

        Ok(Node::new(
            NodeKind::Apply {
                callee: Box::new(callee),
                args: mid,
                spread: Box::new(spread),
            },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_quote(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        match args {
            [quoted] => Ok(Node::new(
                NodeKind::Quote(quoted.clone()),
                env.clone(),
                form.span.clone(),
            )),
            _ => Err(malformed(form, "quote", "expected exactly one form")),
        }
    }

    pub(crate) fn analyze_quasiquote(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        match args {
            [template] => {
                let constructed = self.quasiquote(template)?;
                self.analyze(&constructed, env)
            }
            _ => Err(malformed(form, "quasiquote", "expected exactly one template")),
        }
    }

    pub(crate) fn analyze_defstruct(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        if !env.def_allowed() {
            return Err(AnalyzerError::NestedDefForbidden {
                form: "defstruct".to_string(),
                span: form.span.clone(),
            });
        }

        let (name_form, fields_form) = match args {
            [name, fields] => (name, fields),
            _ => return Err(malformed(form, "defstruct", "expected a name and a field vector")),
        };
        let name = plain_symbol(
            name_form,
            "defstruct",
            "expected the struct name to be an unqualified symbol",
        )?;
        let field_items = fields_form
            .as_vector()
            .ok_or_else(|| malformed(fields_form, "defstruct", "expected a field vector"))?;
        let fields = field_items
            .iter()
            .map(|field| plain_symbol(field, "defstruct", "expected fields to be plain symbols"))
            .collect::<AnalyzerResult<Vec<_>>>()?;

        Ok(Node::new(
            NodeKind::Defstruct { name, fields },
            env.clone(),
            form.span.clone(),
        ))
    }

    pub(crate) fn analyze_host_array_get(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        match args {
            [target, index] => {
                let arg_env = env.with_context(ExecutionContext::Expression);
                let target = self.analyze(target, &arg_env)?;
                let index = self.analyze(index, &arg_env)?;
                Ok(Node::new(
                    NodeKind::HostArrayGet {
                        target: Box::new(target),
                        index: Box::new(index),
                    },
                    env.clone(),
                    form.span.clone(),
                ))
            }
            _ => Err(malformed(form, "host/aget", "expected a target and an index")),
        }
    }

    pub(crate) fn analyze_host_array_set(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        match args {
            [target, index, value] => {
                let arg_env = env.with_context(ExecutionContext::Expression);
                let target = self.analyze(target, &arg_env)?;
                let index = self.analyze(index, &arg_env)?;
                let value = self.analyze(value, &arg_env)?;
                Ok(Node::new(
                    NodeKind::HostArraySet {
                        target: Box::new(target),
                        index: Box::new(index),
                        value: Box::new(value),
                    },
                    env.clone(),
                    form.span.clone(),
                ))
            }
            _ => Err(malformed(
                form,
                "host/aset",
                "expected a target, an index, and a value",
            )),
        }
    }

    pub(crate) fn analyze_host_array_push(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        match args {
            [target, value] => {
                let arg_env = env.with_context(ExecutionContext::Expression);
                let target = self.analyze(target, &arg_env)?;
                let value = self.analyze(value, &arg_env)?;
                Ok(Node::new(
                    NodeKind::HostArrayPush {
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                    env.clone(),
                    form.span.clone(),
                ))
            }
            _ => Err(malformed(form, "host/apush", "expected a target and a value")),
        }
    }

    pub(crate) fn analyze_host_array_unset(
        &mut self,
        form: &Form,
        args: &[Form],
        env: &NodeEnvironment,
    ) -> AnalyzerResult<Node> {
        match args {
            [target, index] => {
                let arg_env = env.with_context(ExecutionContext::Expression);
                let target = self.analyze(target, &arg_env)?;
                let index = self.analyze(index, &arg_env)?;
                Ok(Node::new(
                    NodeKind::HostArrayUnset {
                        target: Box::new(target),
                        index: Box::new(index),
                    },
                    env.clone(),
                    form.span.clone(),
                ))
            }
            _ => Err(malformed(form, "host/aunset", "expected a target and an index")),
        }
    }

    /// Statements followed by a final form analyzed in `result_context`.
    /// An empty body becomes a single literal nil.
    fn analyze_body(
        &mut self,
        forms: &[Form],
        env: &NodeEnvironment,
        result_context: ExecutionContext,
        span: &Option<SourceSpan>,
    ) -> AnalyzerResult<Vec<Node>> {
        match forms.split_last() {
            None => {
                let result_env = env.with_context(result_context);
                Ok(vec![self.nil_literal(&result_env, span)])
            }
            Some((last, init)) => {
                let stmt_env = env.with_context(ExecutionContext::Statement);
                let mut body = init
                    .iter()
                    .map(|stmt| self.analyze(stmt, &stmt_env))
                    .collect::<AnalyzerResult<Vec<_>>>()?;
                body.push(self.analyze(last, &env.with_context(result_context))?);
                Ok(body)
            }
        }
    }
}

fn malformed(at: &Form, form: &str, message: &str) -> AnalyzerError {
    AnalyzerError::MalformedSpecialForm {
        form: form.to_string(),
        message: message.to_string(),
        span: at.span.clone(),
    }
}

fn plain_symbol(at: &Form, form: &str, message: &str) -> AnalyzerResult<Symbol> {
    match at.as_symbol() {
        Some(symbol) if !symbol.is_qualified() => Ok(symbol.clone()),
        _ => Err(malformed(at, form, message)),
    }
}

fn is_keyword(form: &Form, name: &str) -> bool {
    matches!(&form.kind, FormKind::Keyword(keyword) if keyword.0 == name)
}

/// `catch` or `finally` when the form is a clause list, `None` for body
/// forms.
fn clause_head(form: &Form) -> Option<&str> {
    let head = form.as_list()?.first()?.as_symbol()?;
    if head.is_qualified() {
        return None;
    }
    match head.name.as_str() {
        "catch" | "finally" => Some(head.name.as_str()),
        _ => None,
    }
}
