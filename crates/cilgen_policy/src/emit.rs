//! Single-pass policy-source emitter.
//!
//! One depth-first traversal over the semantic tree dispatches every
//! statement into its section buffer. Grouped facts (user roles, alias
//! lists, category order) accumulate in multimaps during the walk and render
//! afterwards, followed by the sorted context-rule families. The section
//! buffers concatenate, in fixed order, into the final artifact.

use crate::error::{Error, Result};
use crate::expr::render_expr;
use crate::multimap::{Entry, Multimap};
use crate::sort;
use cilgen_ast::db::{FileConKind, PolicyDb};
use cilgen_ast::{
    AvRule, CatItem, CatSet, Constrain, Context, Level, LevelRange, Statement, SymbolId,
    SymbolTable, TypeRule,
};
use cilgen_tree::{walk, NodeId, Tree, VisitAction, Visitor};
use std::fmt::Write as _;
use tracing::debug;

/// Output sections of the artifact, in concatenation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Bare `class <name>` declarations.
    ClassDecls,
    /// Initial SID names.
    InitialSids,
    /// Common permission sets.
    Commons,
    /// Full class/permission declarations.
    Classes,
    /// Interface placeholders; currently always empty.
    Interfaces,
    /// Dominance line and sensitivity declarations.
    Sensitivities,
    /// Category declarations.
    Categories,
    /// Security levels.
    Levels,
    /// Constraints and MLS constraints.
    Constraints,
    /// Type, attribute, role, boolean, permissive, and capability
    /// declarations.
    Declarations,
    /// Type aliases and role-type/role-dominance facts.
    Aliases,
    /// Access-vector rules, type rules, file transitions, role transitions,
    /// role allows, and type bounds.
    Rules,
    /// Boolean-conditional blocks.
    Conditionals,
    /// Grouped user-role statements.
    UserRoles,
    /// SID-to-context bindings.
    Sids,
    /// Sorted network and device context families.
    NetContexts,
}

impl Section {
    /// Number of sections in the artifact.
    pub const COUNT: usize = 16;

    const fn index(self) -> usize {
        self as usize
    }
}

/// Per-emission transient storage: one in-memory buffer per section, created
/// fresh for each call and consumed by [`EmissionCtx::finish`].
#[derive(Debug)]
struct EmissionCtx {
    sections: [String; Section::COUNT],
}

impl EmissionCtx {
    fn new() -> Self {
        Self {
            sections: std::array::from_fn(|_| String::new()),
        }
    }

    fn buf(&mut self, section: Section) -> &mut String {
        &mut self.sections[section.index()]
    }

    fn finish(self) -> String {
        self.sections.concat()
    }
}

/// Renders the whole database to policy source text.
///
/// Fail-fast: the first error aborts the emission and no partial artifact is
/// returned.
///
/// # Errors
///
/// - [`Error::UnexpectedFlavor`] when a statement appears at a dispatch site
///   that does not admit it
/// - [`Error::MissingData`] for a class or common with no permissions, or a
///   user with no associated roles
/// - Expression errors from condition and constraint rendering
/// - [`Error::Fmt`] when writing a section buffer fails
pub fn generate_policy(db: &PolicyDb) -> Result<String> {
    debug!(nodes = db.ast.len(), "generating policy source");
    let mut ctx = EmissionCtx::new();

    if !db.dominance.is_empty() {
        let order = join_names(&db.symbols, &db.dominance);
        writeln!(ctx.buf(Section::Sensitivities), "dominance {{ {order} }};")?;
    }

    let mut cats = Multimap::new();
    for &cat in &db.cat_order {
        cats.insert(cat, None);
    }

    let mut visitor = GenPolicyVisitor {
        symbols: &db.symbols,
        ctx: &mut ctx,
        userroles: Multimap::new(),
        sens: Multimap::new(),
        cats,
    };
    walk(&db.ast, db.ast.root(), &mut visitor)?;
    let GenPolicyVisitor {
        userroles,
        sens,
        cats,
        ..
    } = visitor;

    for entry in sens.entries() {
        write_grouped_decl(ctx.buf(Section::Sensitivities), &db.symbols, "sensitivity", entry)?;
    }
    for entry in cats.entries() {
        write_grouped_decl(ctx.buf(Section::Categories), &db.symbols, "category", entry)?;
    }
    for entry in userroles.entries() {
        let user = db.symbols.name(entry.key);
        if entry.values.is_empty() {
            return Err(Error::MissingData(format!(
                "user '{user}' has no associated roles"
            )));
        }
        let roles = join_names(&db.symbols, &entry.values);
        writeln!(ctx.buf(Section::UserRoles), "user {user} roles {{ {roles} }};")?;
    }

    write_net_contexts(&mut ctx, db)?;

    debug!("policy source complete");
    Ok(ctx.finish())
}

/// Visitor driving the main emission walk.
struct GenPolicyVisitor<'a> {
    symbols: &'a SymbolTable,
    ctx: &'a mut EmissionCtx,
    userroles: Multimap,
    sens: Multimap,
    cats: Multimap,
}

impl<'a> GenPolicyVisitor<'a> {
    fn name(&self, id: SymbolId) -> &'a str {
        self.symbols.name(id)
    }

    /// Collects the `Perm` children of a class or common declaration.
    fn perm_names(
        &self,
        tree: &Tree<Statement>,
        node: NodeId,
        site: &'static str,
    ) -> Result<Vec<&'a str>> {
        let mut perms = Vec::new();
        for &child in tree.children(node) {
            match tree.value(child) {
                Statement::Perm { name } => perms.push(self.name(*name)),
                other => {
                    return Err(Error::UnexpectedFlavor {
                        flavor: other.flavor(),
                        site,
                    })
                }
            }
        }
        Ok(perms)
    }

    fn emit_common(&mut self, tree: &Tree<Statement>, node: NodeId, name: SymbolId) -> Result<()> {
        let perms = self.perm_names(tree, node, "common declaration")?;
        if perms.is_empty() {
            return Err(Error::MissingData(format!(
                "common '{}' has no permissions",
                self.name(name)
            )));
        }
        let name = self.name(name);
        let perms = perms.join(" ");
        writeln!(self.ctx.buf(Section::Commons), "common {name} {{ {perms} }}")?;
        Ok(())
    }

    fn emit_class(
        &mut self,
        tree: &Tree<Statement>,
        node: NodeId,
        name: SymbolId,
        common: Option<SymbolId>,
    ) -> Result<()> {
        let perms = self.perm_names(tree, node, "class declaration")?;
        if perms.is_empty() && common.is_none() {
            return Err(Error::MissingData(format!(
                "class '{}' has no permissions",
                self.name(name)
            )));
        }
        let name = self.name(name);
        writeln!(self.ctx.buf(Section::ClassDecls), "class {name}")?;

        let full = self.ctx.buf(Section::Classes);
        write!(full, "class {name}")?;
        if let Some(common) = common {
            write!(full, " inherits {}", self.symbols.name(common))?;
        }
        if !perms.is_empty() {
            write!(full, " {{ {} }}", perms.join(" "))?;
        }
        writeln!(full)?;
        Ok(())
    }

    /// Renders one `if <expr> { ... } [else { ... }]` pair. The block's
    /// children must be a leading `CondTrue` marker and at most one trailing
    /// `CondFalse` marker; any other shape is rejected rather than rendered
    /// as an unmatched block.
    fn emit_booleanif(
        &mut self,
        tree: &Tree<Statement>,
        node: NodeId,
        expr: &[cilgen_ast::ExprToken],
    ) -> Result<()> {
        let condition = render_expr(self.symbols, expr)?;

        let branches = tree.children(node);
        let Some((&true_branch, rest)) = branches.split_first() else {
            return Err(Error::MissingData(format!(
                "conditional on {condition} has no true branch"
            )));
        };
        if !matches!(tree.value(true_branch), Statement::CondTrue) {
            return Err(Error::UnexpectedFlavor {
                flavor: tree.value(true_branch).flavor(),
                site: "conditional block",
            });
        }
        let false_branch = match rest {
            [] => None,
            [only] if matches!(tree.value(*only), Statement::CondFalse) => Some(*only),
            [only] => {
                return Err(Error::UnexpectedFlavor {
                    flavor: tree.value(*only).flavor(),
                    site: "conditional block",
                })
            }
            [_, extra, ..] => {
                return Err(Error::UnexpectedFlavor {
                    flavor: tree.value(*extra).flavor(),
                    site: "conditional block",
                })
            }
        };

        let out = self.ctx.buf(Section::Conditionals);
        writeln!(out, "if {condition} {{")?;
        let mut branch_visitor = BranchVisitor {
            symbols: self.symbols,
            out: &mut *out,
        };
        walk(tree, true_branch, &mut branch_visitor)?;
        writeln!(out, "}}")?;

        if let Some(false_branch) = false_branch {
            writeln!(out, "else {{")?;
            let mut branch_visitor = BranchVisitor {
                symbols: self.symbols,
                out: &mut *out,
            };
            walk(tree, false_branch, &mut branch_visitor)?;
            writeln!(out, "}}")?;
        }
        Ok(())
    }
}

impl Visitor<Statement> for GenPolicyVisitor<'_> {
    type Error = Error;

    #[allow(clippy::too_many_lines)]
    fn on_visit(&mut self, tree: &Tree<Statement>, node: NodeId) -> Result<VisitAction> {
        match tree.value(node) {
            // Structural nodes; nothing to emit.
            Statement::Root
            | Statement::Block { .. }
            | Statement::CondTrue
            | Statement::CondFalse
            | Statement::Perm { .. }
            | Statement::Raw { .. } => {}

            Statement::Macro { .. } => return Ok(VisitAction::SkipSubtree),
            Statement::Optional { enabled, .. } => {
                if !*enabled {
                    return Ok(VisitAction::SkipSubtree);
                }
            }

            Statement::BooleanIf { expr } => {
                self.emit_booleanif(tree, node, expr)?;
                return Ok(VisitAction::SkipSubtree);
            }

            // Grouped facts accumulate in multimaps and render after the walk.
            Statement::User { name } => self.userroles.insert(*name, None),
            Statement::UserRole { user, role } => self.userroles.insert(*user, Some(*role)),
            Statement::Sens { name } => self.sens.insert(*name, None),
            Statement::SensAlias { sens, alias } => self.sens.insert(*sens, Some(*alias)),
            Statement::CatAlias { cat, alias } => self.cats.insert(*cat, Some(*alias)),

            Statement::Common { name } => {
                self.emit_common(tree, node, *name)?;
                return Ok(VisitAction::SkipSubtree);
            }
            Statement::Class { name, common } => {
                self.emit_class(tree, node, *name, *common)?;
                return Ok(VisitAction::SkipSubtree);
            }

            Statement::Type { name } => {
                let name = self.name(*name);
                writeln!(self.ctx.buf(Section::Declarations), "type {name};")?;
            }
            Statement::TypeAttribute { name } => {
                let name = self.name(*name);
                writeln!(self.ctx.buf(Section::Declarations), "attribute {name};")?;
            }
            Statement::Role { name } => {
                let name = self.name(*name);
                writeln!(self.ctx.buf(Section::Declarations), "role {name};")?;
            }
            Statement::Bool { name, value } => {
                let name = self.name(*name);
                writeln!(self.ctx.buf(Section::Declarations), "bool {name} {value};")?;
            }
            Statement::PolicyCap { name } => {
                let name = self.name(*name);
                writeln!(self.ctx.buf(Section::Declarations), "policycap {name};")?;
            }
            Statement::TypePermissive { ty } => {
                let ty = self.name(*ty);
                writeln!(self.ctx.buf(Section::Declarations), "permissive {ty};")?;
            }

            Statement::TypeAlias { ty, alias } => {
                let (ty, alias) = (self.name(*ty), self.name(*alias));
                writeln!(self.ctx.buf(Section::Aliases), "typealias {ty} alias {alias};")?;
            }
            Statement::RoleType { role, ty } => {
                let (role, ty) = (self.name(*role), self.name(*ty));
                writeln!(self.ctx.buf(Section::Aliases), "role {role} types {ty};")?;
            }
            Statement::RoleDominance { role, dominated } => {
                let (role, dominated) = (self.name(*role), self.name(*dominated));
                writeln!(
                    self.ctx.buf(Section::Aliases),
                    "dominance {{ role {role} {{ role {dominated}; }} }}"
                )?;
            }

            Statement::TypeBounds { ty, bounds } => {
                let (ty, bounds) = (self.name(*ty), self.name(*bounds));
                writeln!(self.ctx.buf(Section::Rules), "typebounds {ty} {bounds};")?;
            }
            Statement::AvRule(rule) => {
                write_avrule(self.ctx.buf(Section::Rules), self.symbols, rule)?;
            }
            Statement::TypeRule(rule) => {
                write_typerule(self.ctx.buf(Section::Rules), self.symbols, rule)?;
            }
            Statement::FileTransition {
                src,
                exec,
                class,
                result,
                path,
            } => {
                let (src, exec) = (self.name(*src), self.name(*exec));
                let (class, result) = (self.name(*class), self.name(*result));
                writeln!(
                    self.ctx.buf(Section::Rules),
                    "type_transition {src} {exec} : {class} {result} {path};"
                )?;
            }
            Statement::RoleTransition {
                src,
                tgt,
                class,
                result,
            } => {
                let (src, tgt) = (self.name(*src), self.name(*tgt));
                let (class, result) = (self.name(*class), self.name(*result));
                writeln!(
                    self.ctx.buf(Section::Rules),
                    "role_transition {src} {tgt}:{class} {result};"
                )?;
            }
            Statement::RoleAllow { src, tgt } => {
                let (src, tgt) = (self.name(*src), self.name(*tgt));
                writeln!(self.ctx.buf(Section::Rules), "roleallow {src} {tgt};")?;
            }

            Statement::Level { level } => {
                let text = level_text(self.symbols, level);
                writeln!(self.ctx.buf(Section::Levels), "level {text};")?;
            }
            Statement::Constrain(constrain) => {
                write_constrain(self.ctx.buf(Section::Constraints), self.symbols, "constrain", constrain)?;
            }
            Statement::MlsConstrain(constrain) => {
                write_constrain(
                    self.ctx.buf(Section::Constraints),
                    self.symbols,
                    "mlsconstrain",
                    constrain,
                )?;
            }

            Statement::Sid { name } => {
                let name = self.name(*name);
                writeln!(self.ctx.buf(Section::InitialSids), "sid {name}")?;
            }
            Statement::SidContext { sid, context } => {
                let sid = self.name(*sid);
                let context = context_text(self.symbols, context);
                writeln!(self.ctx.buf(Section::Sids), "sid {sid} {context}")?;
            }
        }
        Ok(VisitAction::Continue)
    }
}

/// Visitor for the body of one conditional branch. Only access-vector and
/// type rules are admissible inside a conditional block.
struct BranchVisitor<'a> {
    symbols: &'a SymbolTable,
    out: &'a mut String,
}

impl Visitor<Statement> for BranchVisitor<'_> {
    type Error = Error;

    fn on_visit(&mut self, tree: &Tree<Statement>, node: NodeId) -> Result<VisitAction> {
        match tree.value(node) {
            Statement::AvRule(rule) => write_avrule(self.out, self.symbols, rule)?,
            Statement::TypeRule(rule) => write_typerule(self.out, self.symbols, rule)?,
            other => {
                return Err(Error::UnexpectedFlavor {
                    flavor: other.flavor(),
                    site: "conditional branch",
                })
            }
        }
        Ok(VisitAction::SkipSubtree)
    }
}

fn write_avrule(out: &mut String, symbols: &SymbolTable, rule: &AvRule) -> Result<()> {
    let (src, tgt) = (symbols.name(rule.src), symbols.name(rule.tgt));
    let class = symbols.name(rule.class);
    let perms = join_names(symbols, &rule.perms);
    writeln!(
        out,
        "{} {src} {tgt}:{class} {{ {perms} }};",
        rule.kind.keyword()
    )?;
    Ok(())
}

fn write_typerule(out: &mut String, symbols: &SymbolTable, rule: &TypeRule) -> Result<()> {
    let (src, tgt) = (symbols.name(rule.src), symbols.name(rule.tgt));
    let (class, result) = (symbols.name(rule.class), symbols.name(rule.result));
    writeln!(
        out,
        "{} {src} {tgt} : {class} {result};",
        rule.kind.keyword()
    )?;
    Ok(())
}

fn write_constrain(
    out: &mut String,
    symbols: &SymbolTable,
    keyword: &str,
    constrain: &Constrain,
) -> Result<()> {
    let classes = join_names(symbols, &constrain.classes);
    let perms = join_names(symbols, &constrain.perms);
    let expr = render_expr(symbols, &constrain.expr)?;
    writeln!(out, "{keyword} {{ {classes} }} {{ {perms} }} {expr};")?;
    Ok(())
}

fn write_grouped_decl(
    out: &mut String,
    symbols: &SymbolTable,
    keyword: &str,
    entry: &Entry,
) -> Result<()> {
    let name = symbols.name(entry.key);
    if entry.values.is_empty() {
        writeln!(out, "{keyword} {name};")?;
    } else {
        let aliases = join_names(symbols, &entry.values);
        writeln!(out, "{keyword} {name} alias {aliases};")?;
    }
    Ok(())
}

/// Sorts each context-rule family with its comparator and renders them, in
/// family order, into the net-contexts section. Sorts are stable: entries
/// that compare equal keep declaration order.
fn write_net_contexts(ctx: &mut EmissionCtx, db: &PolicyDb) -> Result<()> {
    let symbols = &db.symbols;
    let out = ctx.buf(Section::NetContexts);

    let mut netifcons: Vec<_> = db.netifcons.iter().collect();
    netifcons.sort_by(|a, b| sort::compare_netifcon(a, b));
    for n in netifcons {
        let if_ctx = context_text(symbols, &n.if_context);
        let pkt_ctx = context_text(symbols, &n.packet_context);
        writeln!(out, "netifcon {} {if_ctx} {pkt_ctx};", n.interface)?;
    }

    let mut genfscons: Vec<_> = db.genfscons.iter().collect();
    genfscons.sort_by(|a, b| sort::compare_genfscon(a, b));
    for g in genfscons {
        let context = context_text(symbols, &g.context);
        writeln!(out, "genfscon {} {} {context};", g.fs_type, g.path)?;
    }

    let mut portcons: Vec<_> = db.portcons.iter().collect();
    portcons.sort_by(|a, b| sort::compare_portcon(a, b));
    for p in portcons {
        let context = context_text(symbols, &p.context);
        writeln!(
            out,
            "portcon {} {}-{} {context};",
            p.proto.keyword(),
            p.low,
            p.high
        )?;
    }

    let mut nodecons: Vec<_> = db.nodecons.iter().collect();
    nodecons.sort_by(|a, b| sort::compare_nodecon(a, b));
    for n in nodecons {
        let context = context_text(symbols, &n.context);
        writeln!(out, "nodecon {} {} {context};", n.addr, n.mask)?;
    }

    let mut pirqcons: Vec<_> = db.pirqcons.iter().collect();
    pirqcons.sort_by(|a, b| sort::compare_pirqcon(a, b));
    for p in pirqcons {
        let context = context_text(symbols, &p.context);
        writeln!(out, "pirqcon {} {context};", p.pirq)?;
    }

    let mut iomemcons: Vec<_> = db.iomemcons.iter().collect();
    iomemcons.sort_by(|a, b| sort::compare_iomemcon(a, b));
    for i in iomemcons {
        let context = context_text(symbols, &i.context);
        writeln!(out, "iomemcon {}-{} {context};", i.low, i.high)?;
    }

    let mut ioportcons: Vec<_> = db.ioportcons.iter().collect();
    ioportcons.sort_by(|a, b| sort::compare_ioportcon(a, b));
    for i in ioportcons {
        let context = context_text(symbols, &i.context);
        writeln!(out, "ioportcon {}-{} {context};", i.low, i.high)?;
    }

    let mut pcidevicecons: Vec<_> = db.pcidevicecons.iter().collect();
    pcidevicecons.sort_by(|a, b| sort::compare_pcidevicecon(a, b));
    for p in pcidevicecons {
        let context = context_text(symbols, &p.context);
        writeln!(out, "pcidevicecon {} {context};", p.dev)?;
    }

    let mut fs_uses: Vec<_> = db.fs_uses.iter().collect();
    fs_uses.sort_by(|a, b| sort::compare_fsuse(a, b));
    for f in fs_uses {
        let context = context_text(symbols, &f.context);
        writeln!(out, "{} {} {context};", f.kind.keyword(), f.fs_type)?;
    }

    let mut filecons: Vec<_> = db.filecons.iter().collect();
    filecons.sort_by(|a, b| sort::compare_filecon(a, b));
    for f in filecons {
        let context = context_text(symbols, &f.context);
        if f.kind == FileConKind::Any {
            writeln!(out, "filecon {} {context};", f.path)?;
        } else {
            writeln!(out, "filecon {} {} {context};", f.path, f.kind.flag())?;
        }
    }

    Ok(())
}

fn join_names(symbols: &SymbolTable, ids: &[SymbolId]) -> String {
    ids.iter()
        .map(|&id| symbols.name(id))
        .collect::<Vec<_>>()
        .join(" ")
}

fn cats_text(symbols: &SymbolTable, cats: &CatSet) -> String {
    cats.items
        .iter()
        .map(|item| match *item {
            CatItem::Cat(cat) => symbols.name(cat).to_string(),
            CatItem::Range { low, high } => {
                format!("{}.{}", symbols.name(low), symbols.name(high))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn level_text(symbols: &SymbolTable, level: &Level) -> String {
    let sens = symbols.name(level.sens);
    if level.cats.items.is_empty() {
        sens.to_string()
    } else {
        format!("{sens}:{}", cats_text(symbols, &level.cats))
    }
}

fn range_text(symbols: &SymbolTable, range: &LevelRange) -> String {
    format!(
        "{}-{}",
        level_text(symbols, &range.low),
        level_text(symbols, &range.high)
    )
}

fn context_text(symbols: &SymbolTable, context: &Context) -> String {
    format!(
        "{}:{}:{}:{}",
        symbols.name(context.user),
        symbols.name(context.role),
        symbols.name(context.ty),
        range_text(symbols, &context.range)
    )
}
