//! Keyword-driven AST builder.
//!
//! Consumes the raw parse tree (statement lists of string tokens) and
//! produces the flavor-tagged semantic tree. Classification happens only at
//! the head of a statement list; the rest of the line is payload. Statements
//! whose tail is itself a token list (access-vector rules) are terminal:
//! their class and permission tokens are consumed here and never re-scanned
//! as nested keywords.

use crate::error::{Error, Result};
use crate::model::{AvRule, AvRuleKind, Statement};
use crate::symtab::SymbolTable;
use cilgen_tree::{NodeId, Tree};
use tracing::debug;

/// Payload of a raw parse tree node: an interior statement list or a leaf
/// token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseValue {
    /// Interior node grouping the tokens of one statement.
    List,
    /// Leaf token.
    Token(String),
}

/// The raw parse tree produced by the upstream lexer/parser.
pub type ParseTree = Tree<ParseValue>;

/// Builds the semantic tree from a raw parse tree.
///
/// Recognized keywords become flavor-tagged statements; unrecognized
/// keywords are preserved structurally as [`Statement::Raw`] for later
/// passes.
///
/// # Errors
///
/// Returns [`Error::MalformedTree`] if the parse tree violates the
/// list-of-statement-lists shape, or [`Error::MalformedStatement`] if a
/// recognized keyword is missing required argument tokens.
pub fn build_ast(parse: &ParseTree, symbols: &mut SymbolTable) -> Result<Tree<Statement>> {
    let mut ast = Tree::new(Statement::Root);
    let ast_root = ast.root();
    build_scope(parse, parse.root(), &mut ast, ast_root, symbols)?;
    Ok(ast)
}

/// Builds every statement list under `scope` into children of `parent`.
fn build_scope(
    parse: &ParseTree,
    scope: NodeId,
    ast: &mut Tree<Statement>,
    parent: NodeId,
    symbols: &mut SymbolTable,
) -> Result<()> {
    for &child in parse.children(scope) {
        match parse.value(child) {
            ParseValue::List => build_statement(parse, child, ast, parent, symbols)?,
            ParseValue::Token(token) => {
                return Err(Error::MalformedTree(format!(
                    "stray token '{token}' outside a statement list (line {})",
                    parse.node(child).line()
                )));
            }
        }
    }
    Ok(())
}

fn build_statement(
    parse: &ParseTree,
    stmt: NodeId,
    ast: &mut Tree<Statement>,
    parent: NodeId,
    symbols: &mut SymbolTable,
) -> Result<()> {
    let line = parse.node(stmt).line();
    let children = parse.children(stmt);
    let Some(&head) = children.first() else {
        return Err(Error::MalformedTree(format!(
            "empty statement list at line {line}"
        )));
    };
    let ParseValue::Token(keyword) = parse.value(head) else {
        // A list in keyword position means the upstream parser emitted a
        // bare grouping; treat its entries as statements of this scope.
        return build_scope(parse, stmt, ast, parent, symbols);
    };

    match keyword.as_str() {
        "block" => {
            let name = token_arg(parse, children, 1, line, "block name")?;
            let name = symbols.intern(name);
            let block = ast.add_child(parent, Statement::Block { name }, line);
            for &rest in &children[2..] {
                match parse.value(rest) {
                    ParseValue::List => build_statement(parse, rest, ast, block, symbols)?,
                    ParseValue::Token(token) => {
                        return Err(Error::MalformedStatement {
                            line,
                            reason: format!("unexpected token '{token}' in block header"),
                        });
                    }
                }
            }
        }
        "type" => {
            let name = token_arg(parse, children, 1, line, "type name")?;
            let name = symbols.intern(name);
            ast.add_child(parent, Statement::Type { name }, line);
        }
        "attribute" => {
            let name = token_arg(parse, children, 1, line, "attribute name")?;
            let name = symbols.intern(name);
            ast.add_child(parent, Statement::TypeAttribute { name }, line);
        }
        "role" => {
            let name = token_arg(parse, children, 1, line, "role name")?;
            let name = symbols.intern(name);
            ast.add_child(parent, Statement::Role { name }, line);
        }
        "boolean" => {
            let name = token_arg(parse, children, 1, line, "boolean name")?;
            let value = token_arg(parse, children, 2, line, "boolean value")?;
            let value = match value {
                "true" => true,
                "false" => false,
                other => {
                    return Err(Error::MalformedStatement {
                        line,
                        reason: format!("boolean value must be true or false, found '{other}'"),
                    });
                }
            };
            let name = symbols.intern(name);
            ast.add_child(parent, Statement::Bool { name, value }, line);
        }
        "allow" | "auditallow" | "dontaudit" | "neverallow" => {
            let kind = match keyword.as_str() {
                "allow" => AvRuleKind::Allow,
                "auditallow" => AvRuleKind::AuditAllow,
                "dontaudit" => AvRuleKind::DontAudit,
                _ => AvRuleKind::NeverAllow,
            };
            let rule = build_avrule(parse, children, kind, line, symbols)?;
            ast.add_child(parent, Statement::AvRule(rule), line);
            // Terminal for this line: the class and permission tokens were
            // consumed above and must not be re-scanned as keywords.
        }
        other => {
            debug!(keyword = other, line, "preserving unrecognized keyword");
            let mut args = Vec::new();
            let mut lists = Vec::new();
            for &rest in &children[1..] {
                match parse.value(rest) {
                    ParseValue::Token(token) => args.push(token.clone()),
                    ParseValue::List => lists.push(rest),
                }
            }
            let raw = ast.add_child(
                parent,
                Statement::Raw {
                    keyword: other.to_string(),
                    args,
                },
                line,
            );
            for list in lists {
                build_statement(parse, list, ast, raw, symbols)?;
            }
        }
    }

    Ok(())
}

/// Constructs an access-vector rule payload from the statement tail:
/// source, target, object class, then one or more permission names. One
/// level of list nesting around the class/permission tail is flattened.
fn build_avrule(
    parse: &ParseTree,
    children: &[NodeId],
    kind: AvRuleKind,
    line: u32,
    symbols: &mut SymbolTable,
) -> Result<AvRule> {
    let src = token_arg(parse, children, 1, line, "source type")?;
    let src = symbols.intern(src);
    let tgt = token_arg(parse, children, 2, line, "target type")?;
    let tgt = symbols.intern(tgt);

    let mut tail = Vec::new();
    for &rest in &children[3..] {
        collect_tokens(parse, rest, &mut tail);
    }

    let Some((class_name, perm_names)) = tail.split_first() else {
        return Err(Error::MalformedStatement {
            line,
            reason: "access-vector rule is missing its object class".to_string(),
        });
    };
    if perm_names.is_empty() {
        return Err(Error::MalformedStatement {
            line,
            reason: "access-vector rule has no permissions".to_string(),
        });
    }

    let class = symbols.intern(*class_name);
    let perms = perm_names.iter().map(|p| symbols.intern(*p)).collect();

    Ok(AvRule {
        kind,
        src,
        tgt,
        class,
        perms,
    })
}

/// Collects every leaf token under `node` (inclusive), flattening nesting.
fn collect_tokens<'t>(parse: &'t ParseTree, node: NodeId, out: &mut Vec<&'t str>) {
    match parse.value(node) {
        ParseValue::Token(token) => out.push(token),
        ParseValue::List => {
            for &child in parse.children(node) {
                collect_tokens(parse, child, out);
            }
        }
    }
}

fn token_arg<'t>(
    parse: &'t ParseTree,
    children: &[NodeId],
    index: usize,
    line: u32,
    what: &str,
) -> Result<&'t str> {
    match children.get(index).map(|&id| parse.value(id)) {
        Some(ParseValue::Token(token)) => Ok(token),
        Some(ParseValue::List) => Err(Error::MalformedStatement {
            line,
            reason: format!("expected {what}, found a nested list"),
        }),
        None => Err(Error::MalformedStatement {
            line,
            reason: format!("missing {what}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Flavor;

    /// Appends a statement list with the given leaf tokens, returning its id.
    fn push_line(parse: &mut ParseTree, parent: NodeId, line: u32, tokens: &[&str]) -> NodeId {
        let list = parse.add_child(parent, ParseValue::List, line);
        for token in tokens {
            parse.add_child(list, ParseValue::Token((*token).to_string()), line);
        }
        list
    }

    fn flavors(ast: &Tree<Statement>, parent: NodeId) -> Vec<Flavor> {
        ast.children(parent)
            .iter()
            .map(|&id| ast.value(id).flavor())
            .collect()
    }

    #[test]
    fn builds_declarations_in_order() {
        let mut parse = ParseTree::new(ParseValue::List);
        let root = parse.root();
        push_line(&mut parse, root, 1, &["type", "shadow_t"]);
        push_line(&mut parse, root, 2, &["attribute", "file_type"]);
        push_line(&mut parse, root, 3, &["role", "staff_r"]);
        push_line(&mut parse, root, 4, &["boolean", "allow_execmem", "false"]);

        let mut symbols = SymbolTable::new();
        let ast = build_ast(&parse, &mut symbols).unwrap();

        assert_eq!(
            flavors(&ast, ast.root()),
            [Flavor::Type, Flavor::TypeAttribute, Flavor::Role, Flavor::Bool]
        );
        let Statement::Bool { value, .. } = ast.value(ast.children(ast.root())[3]) else {
            panic!("expected a boolean declaration");
        };
        assert!(!value);
    }

    #[test]
    fn block_scopes_nested_statements() {
        let mut parse = ParseTree::new(ParseValue::List);
        let root = parse.root();
        let block = push_line(&mut parse, root, 1, &["block", "container"]);
        push_line(&mut parse, block, 2, &["type", "inner_t"]);

        let mut symbols = SymbolTable::new();
        let ast = build_ast(&parse, &mut symbols).unwrap();

        let top = ast.children(ast.root());
        assert_eq!(top.len(), 1);
        assert_eq!(ast.value(top[0]).flavor(), Flavor::Block);
        assert_eq!(flavors(&ast, top[0]), [Flavor::Type]);
        assert_eq!(ast.node(ast.children(top[0])[0]).line(), 2);
    }

    #[test]
    fn avrule_line_is_terminal() {
        // Permission names that collide with statement keywords must not be
        // re-scanned as nested statements.
        let mut parse = ParseTree::new(ParseValue::List);
        let root = parse.root();
        let rule = push_line(&mut parse, root, 1, &["allow", "staff_t", "shadow_t"]);
        let tail = parse.add_child(rule, ParseValue::List, 1);
        for token in ["file", "read", "allow", "type"] {
            parse.add_child(tail, ParseValue::Token(token.to_string()), 1);
        }

        let mut symbols = SymbolTable::new();
        let ast = build_ast(&parse, &mut symbols).unwrap();

        let top = ast.children(ast.root());
        assert_eq!(top.len(), 1);
        let Statement::AvRule(av) = ast.value(top[0]) else {
            panic!("expected an access-vector rule");
        };
        assert_eq!(av.kind, AvRuleKind::Allow);
        assert_eq!(symbols.name(av.class), "file");
        let perm_names: Vec<&str> = av.perms.iter().map(|&p| symbols.name(p)).collect();
        assert_eq!(perm_names, ["read", "allow", "type"]);
        assert!(ast.children(top[0]).is_empty());
    }

    #[test]
    fn avrule_accepts_flat_tail() {
        let mut parse = ParseTree::new(ParseValue::List);
        let root = parse.root();
        push_line(
            &mut parse,
            root,
            7,
            &["dontaudit", "staff_t", "etc_t", "dir", "search"],
        );

        let mut symbols = SymbolTable::new();
        let ast = build_ast(&parse, &mut symbols).unwrap();

        let Statement::AvRule(av) = ast.value(ast.children(ast.root())[0]) else {
            panic!("expected an access-vector rule");
        };
        assert_eq!(av.kind, AvRuleKind::DontAudit);
        assert_eq!(av.perms.len(), 1);
    }

    #[test]
    fn unrecognized_keyword_preserved_as_raw() {
        let mut parse = ParseTree::new(ParseValue::List);
        let root = parse.root();
        let outer = push_line(&mut parse, root, 3, &["handleunknown", "deny"]);
        push_line(&mut parse, outer, 4, &["type", "inner_t"]);

        let mut symbols = SymbolTable::new();
        let ast = build_ast(&parse, &mut symbols).unwrap();

        let top = ast.children(ast.root());
        let Statement::Raw { keyword, args } = ast.value(top[0]) else {
            panic!("expected a raw node");
        };
        assert_eq!(keyword, "handleunknown");
        // Argument tokens and nested structure both survive under the
        // untagged node.
        assert_eq!(args, &["deny"]);
        assert_eq!(flavors(&ast, top[0]), [Flavor::Type]);
    }

    #[test]
    fn missing_argument_is_malformed() {
        let mut parse = ParseTree::new(ParseValue::List);
        let root = parse.root();
        push_line(&mut parse, root, 9, &["type"]);

        let mut symbols = SymbolTable::new();
        let err = build_ast(&parse, &mut symbols).unwrap_err();
        assert!(matches!(err, Error::MalformedStatement { line: 9, .. }));
    }

    #[test]
    fn avrule_without_perms_is_malformed() {
        let mut parse = ParseTree::new(ParseValue::List);
        let root = parse.root();
        push_line(&mut parse, root, 2, &["allow", "a_t", "b_t", "file"]);

        let mut symbols = SymbolTable::new();
        let err = build_ast(&parse, &mut symbols).unwrap_err();
        assert!(matches!(err, Error::MalformedStatement { line: 2, .. }));
    }
}
