//! The closed statement model.
//!
//! Every node in the semantic tree carries one [`Statement`]: the variant is
//! the node's flavor, the fields are its payload. Statements are built once
//! by the AST builder (or by upstream passes) and never mutated afterwards.

use crate::context::{Context, Level};
use crate::symtab::SymbolId;
use serde::{Deserialize, Serialize};

/// Kind discriminator for access-vector rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvRuleKind {
    /// Grants the listed permissions.
    Allow,
    /// Audits when the listed permissions are granted.
    AuditAllow,
    /// Suppresses audit of the listed denials.
    DontAudit,
    /// Build-time assertion that the permissions are never granted.
    NeverAllow,
}

impl AvRuleKind {
    /// The policy-source keyword for this kind.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::AuditAllow => "auditallow",
            Self::DontAudit => "dontaudit",
            Self::NeverAllow => "neverallow",
        }
    }
}

/// Kind discriminator for type rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRuleKind {
    /// Default type on object creation.
    Transition,
    /// Type on explicit relabel-from/relabel-to.
    Change,
    /// Type on polyinstantiated member creation.
    Member,
}

impl TypeRuleKind {
    /// The policy-source keyword for this kind.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Transition => "type_transition",
            Self::Change => "type_change",
            Self::Member => "type_member",
        }
    }
}

/// An access-vector rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvRule {
    /// Rule kind.
    pub kind: AvRuleKind,
    /// Source type reference.
    pub src: SymbolId,
    /// Target type reference.
    pub tgt: SymbolId,
    /// Object class reference.
    pub class: SymbolId,
    /// Ordered permission-name list.
    pub perms: Vec<SymbolId>,
}

/// A type rule payload (`type_transition` / `type_change` / `type_member`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRule {
    /// Rule kind.
    pub kind: TypeRuleKind,
    /// Source type reference.
    pub src: SymbolId,
    /// Target type reference.
    pub tgt: SymbolId,
    /// Object class reference.
    pub class: SymbolId,
    /// Resulting type reference.
    pub result: SymbolId,
}

/// Operator in a stack-encoded boolean or constraint expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprOp {
    /// Logical negation (unary).
    Not,
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
    /// Exclusive or.
    Xor,
    /// Equality comparison.
    Eq,
    /// Inequality comparison.
    Neq,
    /// Dominance comparison (constraints only).
    Dom,
    /// Reverse dominance comparison (constraints only).
    DomBy,
    /// Incomparability test (constraints only).
    Incomp,
}

impl ExprOp {
    /// True for the single unary operator.
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Not)
    }

    /// Display text in rendered infix expressions.
    pub const fn display(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::And => "&&",
            Self::Or => "||",
            Self::Xor => "^",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Dom => "dom",
            Self::DomBy => "domby",
            Self::Incomp => "incomp",
        }
    }
}

/// One token of a stack-encoded (postfix) expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprToken {
    /// Boolean reference operand.
    Bool(SymbolId),
    /// Type reference operand.
    Type(SymbolId),
    /// Role reference operand.
    Role(SymbolId),
    /// User reference operand.
    User(SymbolId),
    /// Literal comparison keyword operand (`u1`, `r2`, `h1.l`, ...).
    Literal(String),
    /// Operator.
    Op(ExprOp),
}

/// A constraint payload (`constrain` / `mlsconstrain`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constrain {
    /// Object classes the constraint applies to.
    pub classes: Vec<SymbolId>,
    /// Permissions the constraint restricts.
    pub perms: Vec<SymbolId>,
    /// Stack-encoded constraint expression.
    pub expr: Vec<ExprToken>,
}

/// A semantic tree node's flavor and payload, folded into one tagged value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// Tree root; never emitted.
    Root,
    /// Named scope containing nested statements.
    Block {
        /// Scope name.
        name: SymbolId,
    },
    /// Type declaration.
    Type {
        /// Declared name.
        name: SymbolId,
    },
    /// Type attribute declaration.
    TypeAttribute {
        /// Declared name.
        name: SymbolId,
    },
    /// Type alias fact.
    TypeAlias {
        /// Aliased type.
        ty: SymbolId,
        /// Alias name.
        alias: SymbolId,
    },
    /// Type bounds fact.
    TypeBounds {
        /// Bounded type.
        ty: SymbolId,
        /// Bounding type.
        bounds: SymbolId,
    },
    /// Permissive type marker.
    TypePermissive {
        /// The permissive type.
        ty: SymbolId,
    },
    /// Role declaration.
    Role {
        /// Declared name.
        name: SymbolId,
    },
    /// Role-type authorization fact.
    RoleType {
        /// Role.
        role: SymbolId,
        /// Authorized type.
        ty: SymbolId,
    },
    /// Role allow fact.
    RoleAllow {
        /// Source role.
        src: SymbolId,
        /// Target role.
        tgt: SymbolId,
    },
    /// Role transition rule.
    RoleTransition {
        /// Source role.
        src: SymbolId,
        /// Target type.
        tgt: SymbolId,
        /// Object class.
        class: SymbolId,
        /// Resulting role.
        result: SymbolId,
    },
    /// Role dominance fact.
    RoleDominance {
        /// Dominating role.
        role: SymbolId,
        /// Dominated role.
        dominated: SymbolId,
    },
    /// Boolean declaration with initial value.
    Bool {
        /// Declared name.
        name: SymbolId,
        /// Initial value.
        value: bool,
    },
    /// Boolean-conditional block; children are [`Statement::CondTrue`] and
    /// optionally [`Statement::CondFalse`] branch markers.
    BooleanIf {
        /// Stack-encoded condition.
        expr: Vec<ExprToken>,
    },
    /// True-branch marker under a [`Statement::BooleanIf`].
    CondTrue,
    /// False-branch marker under a [`Statement::BooleanIf`].
    CondFalse,
    /// Access-vector rule.
    AvRule(AvRule),
    /// Type rule.
    TypeRule(TypeRule),
    /// Named file transition.
    FileTransition {
        /// Source type.
        src: SymbolId,
        /// Executable type.
        exec: SymbolId,
        /// Object class.
        class: SymbolId,
        /// Resulting type.
        result: SymbolId,
        /// File name the transition applies to.
        path: String,
    },
    /// Common permission set; children are [`Statement::Perm`] nodes.
    Common {
        /// Declared name.
        name: SymbolId,
    },
    /// Object class declaration; children are [`Statement::Perm`] nodes.
    Class {
        /// Declared name.
        name: SymbolId,
        /// Inherited common permission set, if any.
        common: Option<SymbolId>,
    },
    /// Permission name inside a class or common declaration.
    Perm {
        /// Permission name.
        name: SymbolId,
    },
    /// Security level declaration.
    Level {
        /// Sensitivity plus category set.
        level: Level,
    },
    /// Constraint statement.
    Constrain(Constrain),
    /// MLS constraint statement.
    MlsConstrain(Constrain),
    /// Initial SID declaration.
    Sid {
        /// SID name.
        name: SymbolId,
    },
    /// SID-to-context binding.
    SidContext {
        /// Bound SID.
        sid: SymbolId,
        /// Assigned context.
        context: Context,
    },
    /// Policy capability flag.
    PolicyCap {
        /// Capability name.
        name: SymbolId,
    },
    /// User declaration.
    User {
        /// Declared name.
        name: SymbolId,
    },
    /// User-role fact; folded into grouped statements at emission.
    UserRole {
        /// User.
        user: SymbolId,
        /// Associated role.
        role: SymbolId,
    },
    /// Sensitivity declaration.
    Sens {
        /// Declared name.
        name: SymbolId,
    },
    /// Sensitivity alias fact.
    SensAlias {
        /// Aliased sensitivity.
        sens: SymbolId,
        /// Alias name.
        alias: SymbolId,
    },
    /// Category alias fact.
    CatAlias {
        /// Aliased category.
        cat: SymbolId,
        /// Alias name.
        alias: SymbolId,
    },
    /// Macro definition; its contents are never emitted.
    Macro {
        /// Macro name.
        name: SymbolId,
    },
    /// Optional block; contents are emitted only when enabled.
    Optional {
        /// Block name.
        name: SymbolId,
        /// Whether the block survived resolution.
        enabled: bool,
    },
    /// Unrecognized keyword, preserved structurally but semantically
    /// untagged for later passes.
    Raw {
        /// The keyword token.
        keyword: String,
        /// Remaining argument tokens on the line, in source order.
        args: Vec<String>,
    },
}

/// Fieldless flavor tag for classification and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Flavor {
    Root,
    Block,
    Type,
    TypeAttribute,
    TypeAlias,
    TypeBounds,
    TypePermissive,
    Role,
    RoleType,
    RoleAllow,
    RoleTransition,
    RoleDominance,
    Bool,
    BooleanIf,
    CondTrue,
    CondFalse,
    AvRule,
    TypeRule,
    FileTransition,
    Common,
    Class,
    Perm,
    Level,
    Constrain,
    MlsConstrain,
    Sid,
    SidContext,
    PolicyCap,
    User,
    UserRole,
    Sens,
    SensAlias,
    CatAlias,
    Macro,
    Optional,
    Raw,
}

impl Statement {
    /// The flavor tag for this statement.
    pub const fn flavor(&self) -> Flavor {
        match self {
            Self::Root => Flavor::Root,
            Self::Block { .. } => Flavor::Block,
            Self::Type { .. } => Flavor::Type,
            Self::TypeAttribute { .. } => Flavor::TypeAttribute,
            Self::TypeAlias { .. } => Flavor::TypeAlias,
            Self::TypeBounds { .. } => Flavor::TypeBounds,
            Self::TypePermissive { .. } => Flavor::TypePermissive,
            Self::Role { .. } => Flavor::Role,
            Self::RoleType { .. } => Flavor::RoleType,
            Self::RoleAllow { .. } => Flavor::RoleAllow,
            Self::RoleTransition { .. } => Flavor::RoleTransition,
            Self::RoleDominance { .. } => Flavor::RoleDominance,
            Self::Bool { .. } => Flavor::Bool,
            Self::BooleanIf { .. } => Flavor::BooleanIf,
            Self::CondTrue => Flavor::CondTrue,
            Self::CondFalse => Flavor::CondFalse,
            Self::AvRule(_) => Flavor::AvRule,
            Self::TypeRule(_) => Flavor::TypeRule,
            Self::FileTransition { .. } => Flavor::FileTransition,
            Self::Common { .. } => Flavor::Common,
            Self::Class { .. } => Flavor::Class,
            Self::Perm { .. } => Flavor::Perm,
            Self::Level { .. } => Flavor::Level,
            Self::Constrain(_) => Flavor::Constrain,
            Self::MlsConstrain(_) => Flavor::MlsConstrain,
            Self::Sid { .. } => Flavor::Sid,
            Self::SidContext { .. } => Flavor::SidContext,
            Self::PolicyCap { .. } => Flavor::PolicyCap,
            Self::User { .. } => Flavor::User,
            Self::UserRole { .. } => Flavor::UserRole,
            Self::Sens { .. } => Flavor::Sens,
            Self::SensAlias { .. } => Flavor::SensAlias,
            Self::CatAlias { .. } => Flavor::CatAlias,
            Self::Macro { .. } => Flavor::Macro,
            Self::Optional { .. } => Flavor::Optional,
            Self::Raw { .. } => Flavor::Raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symtab::SymbolTable;

    #[test]
    fn flavor_matches_variant() {
        let mut table = SymbolTable::new();
        let name = table.intern("user_t");

        assert_eq!(Statement::Type { name }.flavor(), Flavor::Type);
        assert_eq!(Statement::Root.flavor(), Flavor::Root);
        assert_eq!(
            Statement::Raw {
                keyword: "handleunknown".to_string(),
                args: vec!["deny".to_string()],
            }
            .flavor(),
            Flavor::Raw
        );
    }

    #[test]
    fn keywords_render_policy_source_spelling() {
        assert_eq!(AvRuleKind::Allow.keyword(), "allow");
        assert_eq!(AvRuleKind::NeverAllow.keyword(), "neverallow");
        assert_eq!(TypeRuleKind::Transition.keyword(), "type_transition");
        assert_eq!(ExprOp::DomBy.display(), "domby");
        assert!(ExprOp::Not.is_unary());
        assert!(!ExprOp::And.is_unary());
    }
}
