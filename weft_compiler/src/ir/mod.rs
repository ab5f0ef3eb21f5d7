//! Intermediate representation for compiled templates
//!
//! The compiler lowers directives into a flat sequence of typed
//! instructions. Branch and loop instructions carry backpatched jump targets
//! so a render pass never re-scans for matching ends: compile once, render
//! many times.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder jump target used inside fragments before backpatching.
/// A finished program must not contain it; `Program::validate` enforces this.
pub const PLACEHOLDER_TARGET: usize = usize::MAX;

/// A literal scalar as written in directive text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarLit {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ScalarLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "'{}'", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One step of a variable path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// Dotted member access (`.name`) or the path root
    Member(String),
    /// Bracketed numeric index (`[0]`)
    Index(i64),
    /// Bracketed string key (`['id']`)
    Key(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(name) => write!(f, ".{}", name),
            Self::Index(i) => write!(f, "[{}]", i),
            Self::Key(k) => write!(f, "['{}']", k),
        }
    }
}

/// A resolved variable reference: a safe nested lookup with an optional
/// literal fallback. Usable both as an existence test and as a value access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarRef {
    /// Path segments; the first is always `Segment::Member` (the root)
    pub segments: Vec<Segment>,
    /// Literal produced when any segment is missing (safe-default mode)
    pub fallback: Option<ScalarLit>,
}

impl VarRef {
    /// Create a reference from segments with no fallback
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            fallback: None,
        }
    }

    /// The root name this reference resolves against
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(Segment::Member(name)) => name,
            _ => "",
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match (i, segment) {
                (0, Segment::Member(name)) => write!(f, "{}", name)?,
                _ => write!(f, "{}", segment)?,
            }
        }
        if let Some(fallback) = &self.fallback {
            write!(f, " ?? {}", fallback)?;
        }
        Ok(())
    }
}

/// Comparison operators allowed in conditional directives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CmpOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            _ => None,
        }
    }
}

/// One side of a comparison: a variable path or a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Path(VarRef),
    Lit(ScalarLit),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(var) => write!(f, "{}", var),
            Self::Lit(lit) => write!(f, "{}", lit),
        }
    }
}

/// A conditional expression: truthiness of a single operand, or a
/// comparison between two
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cond {
    pub lhs: Operand,
    pub cmp: Option<(CmpOp, Operand)>,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lhs)?;
        if let Some((op, rhs)) = &self.cmp {
            write!(f, " {} {}", op.as_str(), rhs)?;
        }
        Ok(())
    }
}

/// A typed render instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    /// Emit passthrough text verbatim
    Literal(String),
    /// Emit the safely-resolved value of a variable reference
    Output(VarRef),
    /// Evaluate the condition; on false jump to `else_target`
    Branch { cond: Cond, else_target: usize },
    /// Unconditional jump
    Jump { target: usize },
    /// End of a conditional construct (patch target, no effect at render)
    BranchEnd,
    /// Guard and enter a loop. When the iterable is missing, empty, or not
    /// iterable, jump to `end_target` (one past the matching `LoopEnd`)
    /// without establishing a loop context.
    LoopStart {
        binding: String,
        iterable: VarRef,
        end_target: usize,
    },
    /// Advance the innermost loop: rebind and jump back to one past
    /// `start_target`, or tear down the context and fall through
    LoopEnd { start_target: usize },
    /// Begin capturing a named block
    SectionStart { name: String },
    /// Finalize the innermost named block
    SectionEnd,
    /// Bind the named entity's field map for the form body
    FormStart { entity: String },
    /// Leave the innermost field-binding scope
    FormEnd,
    /// Emit localized text for a key, substituting `{0}`, `{1}`, ... with
    /// the rendered argument values
    Translate { key: String, args: Vec<VarRef> },
}

impl Instr {
    /// Variable references embedded in this instruction, in source order
    pub fn var_refs(&self) -> Vec<&VarRef> {
        match self {
            Self::Output(var) => vec![var],
            Self::Branch { cond, .. } => {
                let mut refs = Vec::new();
                if let Operand::Path(var) = &cond.lhs {
                    refs.push(var);
                }
                if let Some((_, Operand::Path(var))) = &cond.cmp {
                    refs.push(var);
                }
                refs
            }
            Self::LoopStart { iterable, .. } => vec![iterable],
            Self::Translate { args, .. } => args.iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "literal {:?}", text),
            Self::Output(var) => write!(f, "output {}", var),
            Self::Branch { cond, else_target } => {
                write!(f, "branch {} else -> {}", cond, else_target)
            }
            Self::Jump { target } => write!(f, "jump -> {}", target),
            Self::BranchEnd => write!(f, "branch_end"),
            Self::LoopStart {
                binding,
                iterable,
                end_target,
            } => write!(f, "loop {} in {} end -> {}", binding, iterable, end_target),
            Self::LoopEnd { start_target } => write!(f, "loop_end start -> {}", start_target),
            Self::SectionStart { name } => write!(f, "section {}", name),
            Self::SectionEnd => write!(f, "section_end"),
            Self::FormStart { entity } => write!(f, "form {}", entity),
            Self::FormEnd => write!(f, "form_end"),
            Self::Translate { key, args } => {
                write!(f, "translate {}", key)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// A unit of generated instructions produced by one construct parser call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub instrs: Vec<Instr>,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn one(instr: Instr) -> Self {
        Self {
            instrs: vec![instr],
        }
    }

    pub fn from_instrs(instrs: Vec<Instr>) -> Self {
        Self { instrs }
    }
}

/// A compiled template: the flat instruction sequence plus the variable
/// mode it was compiled under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub instrs: Vec<Instr>,
    /// Whether fallback-less lookups should fault at render when missing
    pub strict_variables: bool,
}

/// Structural defects in a finished program
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProgramError {
    #[error("Instruction {index} has an unpatched jump target")]
    UnpatchedTarget { index: usize },

    #[error("Instruction {index} jumps to {target}, past the program end {len}")]
    TargetOutOfRange {
        index: usize,
        target: usize,
        len: usize,
    },
}

impl Program {
    pub fn new(instrs: Vec<Instr>, strict_variables: bool) -> Self {
        Self {
            instrs,
            strict_variables,
        }
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Check that every jump target was backpatched and lands inside the
    /// program (a target equal to the length is a valid "fall off the end").
    pub fn validate(&self) -> Result<(), ProgramError> {
        let len = self.instrs.len();
        for (index, instr) in self.instrs.iter().enumerate() {
            let target = match instr {
                Instr::Branch { else_target, .. } => Some(*else_target),
                Instr::Jump { target } => Some(*target),
                Instr::LoopStart { end_target, .. } => Some(*end_target),
                Instr::LoopEnd { start_target } => Some(*start_target),
                _ => None,
            };

            if let Some(target) = target {
                if target == PLACEHOLDER_TARGET {
                    return Err(ProgramError::UnpatchedTarget { index });
                }
                if target > len {
                    return Err(ProgramError::TargetOutOfRange { index, target, len });
                }
            }
        }
        Ok(())
    }

    /// Human-readable listing, one instruction per line
    pub fn listing(&self) -> String {
        self.instrs
            .iter()
            .enumerate()
            .map(|(i, instr)| format!("{:4}  {}", i, instr))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_name() -> VarRef {
        VarRef::new(vec![
            Segment::Member("user".to_string()),
            Segment::Member("name".to_string()),
        ])
    }

    #[test]
    fn test_var_ref_display() {
        assert_eq!(user_name().to_string(), "user.name");

        let with_fallback = VarRef {
            segments: vec![
                Segment::Member("items".to_string()),
                Segment::Index(0),
            ],
            fallback: Some(ScalarLit::Str("none".to_string())),
        };
        assert_eq!(with_fallback.to_string(), "items[0] ?? 'none'");
    }

    #[test]
    fn test_instr_var_refs() {
        let branch = Instr::Branch {
            cond: Cond {
                lhs: Operand::Path(user_name()),
                cmp: Some((CmpOp::Eq, Operand::Lit(ScalarLit::Int(3)))),
            },
            else_target: 7,
        };
        assert_eq!(branch.var_refs().len(), 1);

        let literal = Instr::Literal("text".to_string());
        assert!(literal.var_refs().is_empty());
    }

    #[test]
    fn test_validate_rejects_placeholder() {
        let program = Program::new(
            vec![Instr::Jump {
                target: PLACEHOLDER_TARGET,
            }],
            false,
        );
        assert!(matches!(
            program.validate(),
            Err(ProgramError::UnpatchedTarget { index: 0 })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let program = Program::new(vec![Instr::Jump { target: 5 }], false);
        assert!(matches!(
            program.validate(),
            Err(ProgramError::TargetOutOfRange {
                index: 0,
                target: 5,
                len: 1
            })
        ));
    }

    #[test]
    fn test_validate_accepts_fall_off_the_end() {
        let program = Program::new(vec![Instr::Jump { target: 1 }], false);
        assert!(program.validate().is_ok());
    }
}
