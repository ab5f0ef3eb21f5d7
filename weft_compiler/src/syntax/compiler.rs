//! Compiler driver
//!
//! Walks the scanned token sequence left to right, alternating literal
//! passthrough with directive dispatch, and concatenates the generated
//! fragments into one flat program. The driver owns the construct-nesting
//! stack: it matches end directives to their opening construct, validates
//! balanced nesting, and backpatches every branch and loop jump target.
//! Each compilation uses its own driver instance, so concurrent
//! compilations share no state.

use crate::config::constants::compile_time::compiling::{MAX_NESTING_DEPTH, MAX_PROGRAM_LENGTH};
use crate::config::runtime::CompilerPreferences;
use crate::grammar::{conditional, end_dispatch, form, loops, section, translate, Family};
use crate::ir::{Fragment, Instr, Program, VarRef};
use crate::syntax::error::{CompileError, CompileResult};
use crate::tokens::{TemplateToken, TokenKind};
use crate::utils::{Span, Spanned};
use crate::{log_debug, log_error};

/// How fallback-less variable references are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableMode {
    /// Missing paths resolve to their fallback literal, else null; renders
    /// never fault
    #[default]
    SafeDefault,
    /// Every fallback-less reference's root must be bound by an enclosing
    /// construct or declared up front; unresolved roots fail compilation
    Strict,
}

/// Per-compilation options
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub variable_mode: VariableMode,
    /// Root names the render context promises to provide; consulted only
    /// in strict mode
    pub known_roots: Vec<String>,
}

impl CompileOptions {
    /// Strict mode with the given declared roots
    pub fn strict(known_roots: Vec<String>) -> Self {
        Self {
            variable_mode: VariableMode::Strict,
            known_roots,
        }
    }

    /// Build options from runtime preferences
    pub fn from_preferences(preferences: &CompilerPreferences) -> Self {
        Self {
            variable_mode: if preferences.strict_variables {
                VariableMode::Strict
            } else {
                VariableMode::SafeDefault
            },
            known_roots: preferences.known_roots.clone(),
        }
    }
}

/// Per-family bookkeeping for one open construct
#[derive(Debug)]
enum FrameDetail {
    Loop {
        start_ix: usize,
        binding: String,
    },
    If {
        /// Branch (or alternate branch) whose false edge is still unpatched
        pending_false: Option<usize>,
        /// Jump instructions that must land on the construct end
        end_jumps: Vec<usize>,
        has_else: bool,
    },
    Section,
    Form {
        entity: String,
    },
}

/// One open construct on the compile-time nesting stack
#[derive(Debug)]
struct ConstructFrame {
    family: Family,
    raw: String,
    span: Span,
    detail: FrameDetail,
}

/// The scanning driver: consumes classified tokens, emits one program
pub struct TemplateCompiler {
    options: CompileOptions,
    instrs: Vec<Instr>,
    stack: Vec<ConstructFrame>,
}

impl TemplateCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            instrs: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Compile a token sequence into a program. Consumes the driver: each
    /// compilation gets a fresh nesting stack.
    pub fn compile(mut self, tokens: &[Spanned<TemplateToken>]) -> CompileResult<Program> {
        for token in tokens {
            self.compile_token(token)?;
        }

        if let Some(frame) = self.stack.pop() {
            let error = CompileError::UnclosedConstruct {
                family: frame.family,
                raw: frame.raw,
                span: frame.span,
            };
            log_error!(error.error_code(), "Construct never closed",
                span = frame.span,
                "family" => frame.family
            );
            return Err(error);
        }

        if self.instrs.len() > MAX_PROGRAM_LENGTH {
            return Err(CompileError::ProgramTooLarge {
                instructions: self.instrs.len(),
            });
        }

        let strict = self.options.variable_mode == VariableMode::Strict;
        Ok(Program::new(self.instrs, strict))
    }

    fn compile_token(&mut self, token: &Spanned<TemplateToken>) -> CompileResult<()> {
        match token.value.kind {
            TokenKind::Literal => {
                self.instrs.push(Instr::Literal(token.value.raw.clone()));
                Ok(())
            }
            TokenKind::Variable => {
                let var = crate::grammar::variable::parse_variable_reference(
                    &token.value.raw,
                    &token.value.raw,
                    token.span,
                )?;
                self.check_ref(&var, &token.value.raw, token.span)?;
                self.instrs.push(Instr::Output(var));
                Ok(())
            }
            TokenKind::For => self.open_construct(token, Family::For, loops::parse),
            TokenKind::If => self.open_construct(token, Family::If, conditional::parse),
            TokenKind::Section => self.open_construct(token, Family::Section, section::parse),
            TokenKind::Form => self.open_construct(token, Family::Form, form::parse),
            TokenKind::Translate => {
                // Translations have no body and never join the stack
                let fragment = translate::parse(token)?;
                self.check_fragment(&fragment, &token.value.raw, token.span)?;
                self.append(fragment);
                Ok(())
            }
            TokenKind::ElseIf => self.compile_elseif(token),
            TokenKind::Else => self.compile_else(token),
            TokenKind::End => self.compile_end(token),
        }
    }

    /// Open a stack construct: generate the prologue, validate its
    /// references against the enclosing bindings, then push the frame.
    fn open_construct(
        &mut self,
        token: &Spanned<TemplateToken>,
        family: Family,
        parse: crate::grammar::ParseFn,
    ) -> CompileResult<()> {
        if self.stack.len() >= MAX_NESTING_DEPTH {
            return Err(CompileError::NestingTooDeep {
                depth: self.stack.len() + 1,
                span: token.span,
            });
        }

        let fragment = parse(token)?;
        self.check_fragment(&fragment, &token.value.raw, token.span)?;

        let start_ix = self.instrs.len();
        let detail = match fragment.instrs.first() {
            Some(Instr::LoopStart { binding, .. }) => FrameDetail::Loop {
                start_ix,
                binding: binding.clone(),
            },
            Some(Instr::Branch { .. }) => FrameDetail::If {
                pending_false: Some(start_ix),
                end_jumps: Vec::new(),
                has_else: false,
            },
            Some(Instr::SectionStart { .. }) => FrameDetail::Section,
            Some(Instr::FormStart { entity }) => FrameDetail::Form {
                entity: entity.clone(),
            },
            _ => unreachable!("construct prologues start with their marker instruction"),
        };

        log_debug!("Opening construct",
            "family" => family,
            "depth" => self.stack.len() + 1
        );

        self.append(fragment);
        self.stack.push(ConstructFrame {
            family,
            raw: token.value.raw.clone(),
            span: token.span,
            detail,
        });
        Ok(())
    }

    fn compile_elseif(&mut self, token: &Spanned<TemplateToken>) -> CompileResult<()> {
        let mut frame = self.take_if_frame(token)?;

        let fragment = conditional::parse_elseif(token)?;
        self.check_fragment(&fragment, &token.value.raw, token.span)?;

        // [Jump -> end, Branch cond] : the jump terminates the previous
        // branch, the new branch becomes the pending false edge
        let jump_ix = self.instrs.len();
        self.append(fragment);

        if let FrameDetail::If {
            pending_false,
            end_jumps,
            ..
        } = &mut frame.detail
        {
            if let Some(ix) = pending_false.take() {
                self.patch(ix, jump_ix + 1);
            }
            end_jumps.push(jump_ix);
            *pending_false = Some(jump_ix + 1);
        }

        self.stack.push(frame);
        Ok(())
    }

    fn compile_else(&mut self, token: &Spanned<TemplateToken>) -> CompileResult<()> {
        let mut frame = self.take_if_frame(token)?;

        let fragment = conditional::parse_else(token)?;

        let jump_ix = self.instrs.len();
        self.append(fragment);

        if let FrameDetail::If {
            pending_false,
            end_jumps,
            has_else,
        } = &mut frame.detail
        {
            if let Some(ix) = pending_false.take() {
                self.patch(ix, jump_ix + 1);
            }
            end_jumps.push(jump_ix);
            *has_else = true;
        }

        self.stack.push(frame);
        Ok(())
    }

    /// Pop the enclosing conditional frame for a branch directive,
    /// rejecting branches with nothing to attach to.
    fn take_if_frame(&mut self, token: &Spanned<TemplateToken>) -> CompileResult<ConstructFrame> {
        let misplaced = || CompileError::MisplacedBranch {
            raw: token.value.raw.clone(),
            span: token.span,
        };

        match self.stack.last() {
            Some(frame) if frame.family == Family::If => {}
            _ => return Err(misplaced()),
        }

        let frame = self.stack.pop().expect("just checked");
        if let FrameDetail::If { has_else: true, .. } = frame.detail {
            self.stack.push(frame);
            return Err(misplaced());
        }
        Ok(frame)
    }

    fn compile_end(&mut self, token: &Spanned<TemplateToken>) -> CompileResult<()> {
        let (family, fragment) = end_dispatch::dispatch_end(token)?;

        if !family.requires_end() {
            // Translation closers are accepted for symmetry and compile to
            // an empty epilogue
            self.append(fragment);
            return Ok(());
        }

        let matches_top = self
            .stack
            .last()
            .map(|frame| frame.family == family)
            .unwrap_or(false);
        if !matches_top {
            return Err(CompileError::UnmatchedEnd {
                family,
                raw: token.value.raw.clone(),
                span: token.span,
            });
        }

        let frame = self.stack.pop().expect("just checked");

        log_debug!("Closing construct",
            "family" => family,
            "depth" => self.stack.len() + 1
        );

        match frame.detail {
            FrameDetail::Loop { start_ix, .. } => {
                let end_ix = self.instrs.len();
                self.append(fragment);
                self.patch(end_ix, start_ix);
                self.patch(start_ix, end_ix + 1);
            }
            FrameDetail::If {
                pending_false,
                end_jumps,
                ..
            } => {
                let end_ix = self.instrs.len();
                self.append(fragment);
                if let Some(ix) = pending_false {
                    self.patch(ix, end_ix);
                }
                for jump_ix in end_jumps {
                    self.patch(jump_ix, end_ix);
                }
            }
            FrameDetail::Section | FrameDetail::Form { .. } => {
                self.append(fragment);
            }
        }
        Ok(())
    }

    fn append(&mut self, fragment: Fragment) {
        self.instrs.extend(fragment.instrs);
    }

    /// Backpatch the jump target carried by the instruction at `ix`
    fn patch(&mut self, ix: usize, target: usize) {
        match &mut self.instrs[ix] {
            Instr::Branch { else_target, .. } => *else_target = target,
            Instr::Jump { target: slot } => *slot = target,
            Instr::LoopStart { end_target, .. } => *end_target = target,
            Instr::LoopEnd { start_target } => *start_target = target,
            other => unreachable!("instruction {} carries no jump target", other),
        }
    }

    /// Strict-mode validation for every reference in a fragment
    fn check_fragment(&self, fragment: &Fragment, raw: &str, span: Span) -> CompileResult<()> {
        for instr in &fragment.instrs {
            for var in instr.var_refs() {
                self.check_ref(var, raw, span)?;
            }
        }
        Ok(())
    }

    fn check_ref(&self, var: &VarRef, raw: &str, span: Span) -> CompileResult<()> {
        if self.options.variable_mode != VariableMode::Strict || var.fallback.is_some() {
            return Ok(());
        }

        let root = var.root();
        if self.is_bound(root) {
            return Ok(());
        }

        Err(CompileError::UnresolvedVariablePath {
            root: root.to_string(),
            raw: raw.to_string(),
            span,
        })
    }

    /// Check a root against the compile-time binding environment: loop
    /// items and loop metadata, form entities, and declared roots.
    fn is_bound(&self, root: &str) -> bool {
        if self.options.known_roots.iter().any(|known| known == root) {
            return true;
        }

        self.stack.iter().any(|frame| match &frame.detail {
            FrameDetail::Loop { binding, .. } => {
                binding == root || root == loops::LOOP_META_NAME
            }
            FrameDetail::Form { entity } => entity == root,
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Cond, Operand};
    use crate::scan::TemplateScanner;
    use crate::syntax::error::CompileErrorKind;
    use assert_matches::assert_matches;

    fn compile(source: &str) -> CompileResult<Program> {
        compile_with(source, CompileOptions::default())
    }

    fn compile_with(source: &str, options: CompileOptions) -> CompileResult<Program> {
        let tokens = TemplateScanner::new().scan(source).expect("scan");
        TemplateCompiler::new(options).compile(&tokens)
    }

    #[test]
    fn test_literals_and_variables() {
        let program = compile("Hello {{ user.name }}!").unwrap();

        assert_matches!(
            &program.instrs[..],
            [
                Instr::Literal(a),
                Instr::Output(var),
                Instr::Literal(b),
            ] => {
                assert_eq!(a, "Hello ");
                assert_eq!(var.root(), "user");
                assert_eq!(b, "!");
            }
        );
        program.validate().unwrap();
    }

    #[test]
    fn test_loop_targets_are_backpatched() {
        let program = compile("{{ for user in users }}{{ user.name }}{{ endfor }}").unwrap();

        assert_matches!(
            &program.instrs[..],
            [
                Instr::LoopStart { end_target, .. },
                Instr::Output(_),
                Instr::LoopEnd { start_target },
            ] => {
                assert_eq!(*end_target, 3);
                assert_eq!(*start_target, 0);
            }
        );
        program.validate().unwrap();
    }

    #[test]
    fn test_if_false_edge_lands_on_branch_end() {
        let program = compile("{{ if user.active }}yes{{ endif }}").unwrap();

        assert_matches!(
            &program.instrs[..],
            [
                Instr::Branch { else_target, .. },
                Instr::Literal(_),
                Instr::BranchEnd,
            ] => {
                assert_eq!(*else_target, 2);
            }
        );
        program.validate().unwrap();
    }

    #[test]
    fn test_if_else_patching() {
        let program = compile("{{ if a }}x{{ else }}y{{ endif }}").unwrap();

        // 0 Branch(a) else->3, 1 'x', 2 Jump->5, 3 'y', 4 BranchEnd
        assert_matches!(
            &program.instrs[..],
            [
                Instr::Branch { else_target: 3, .. },
                Instr::Literal(_),
                Instr::Jump { target: 4 },
                Instr::Literal(_),
                Instr::BranchEnd,
            ]
        );
        program.validate().unwrap();
    }

    #[test]
    fn test_if_elseif_else_patching() {
        let program = compile("{{ if a }}1{{ elseif b }}2{{ else }}3{{ endif }}").unwrap();

        // 0 Branch(a) else->3, 1 '1', 2 Jump->end, 3 Branch(b) else->6,
        // 4 '2', 5 Jump->end, 6 '3', 7 BranchEnd
        assert_matches!(
            &program.instrs[..],
            [
                Instr::Branch { else_target: 3, cond: Cond { lhs: Operand::Path(_), cmp: None } },
                Instr::Literal(_),
                Instr::Jump { target: 7 },
                Instr::Branch { else_target: 6, .. },
                Instr::Literal(_),
                Instr::Jump { target: 7 },
                Instr::Literal(_),
                Instr::BranchEnd,
            ]
        );
        program.validate().unwrap();
    }

    #[test]
    fn test_nested_loops_patch_independently() {
        let program = compile(
            "{{ for group in groups }}{{ for user in group.users }}{{ user.name }}{{ endfor }}{{ endfor }}",
        )
        .unwrap();

        assert_matches!(
            &program.instrs[..],
            [
                Instr::LoopStart { end_target: 5, .. },
                Instr::LoopStart { end_target: 4, .. },
                Instr::Output(_),
                Instr::LoopEnd { start_target: 1 },
                Instr::LoopEnd { start_target: 0 },
            ]
        );
        program.validate().unwrap();
    }

    #[test]
    fn test_section_form_translate_lowering() {
        let program = compile(
            "{{ section header }}{{ form user }}{{ translate greeting.hello user.name }}{{ endform }}{{ endsection }}{{ /translate }}",
        )
        .unwrap();

        assert_matches!(
            &program.instrs[..],
            [
                Instr::SectionStart { name },
                Instr::FormStart { entity },
                Instr::Translate { key, args },
                Instr::FormEnd,
                Instr::SectionEnd,
            ] => {
                assert_eq!(name, "header");
                assert_eq!(entity, "user");
                assert_eq!(key, "greeting.hello");
                assert_eq!(args.len(), 1);
            }
        );
    }

    #[test]
    fn test_unclosed_construct_is_reported() {
        let error = compile("{{ for user in users }}body").unwrap_err();
        assert_eq!(error.kind(), CompileErrorKind::UnmatchedDirective);
        assert_matches!(
            error,
            CompileError::UnclosedConstruct { family: Family::For, .. }
        );
    }

    #[test]
    fn test_unmatched_end_is_reported() {
        let error = compile("text{{ endfor }}").unwrap_err();
        assert_matches!(
            error,
            CompileError::UnmatchedEnd { family: Family::For, .. }
        );

        // A closer for the wrong family is unmatched too
        let error = compile("{{ for u in users }}{{ endif }}{{ endfor }}").unwrap_err();
        assert_matches!(error, CompileError::UnmatchedEnd { family: Family::If, .. });
    }

    #[test]
    fn test_unknown_family_end() {
        let error = compile("{{ endwhile }}").unwrap_err();
        assert_eq!(error.kind(), CompileErrorKind::UnknownDirectiveFamily);
    }

    #[test]
    fn test_branch_outside_conditional() {
        let error = compile("{{ else }}").unwrap_err();
        assert_matches!(error, CompileError::MisplacedBranch { .. });

        let error = compile("{{ for u in users }}{{ elseif u }}{{ endfor }}").unwrap_err();
        assert_matches!(error, CompileError::MisplacedBranch { .. });
    }

    #[test]
    fn test_else_after_else_is_rejected() {
        let error = compile("{{ if a }}1{{ else }}2{{ else }}3{{ endif }}").unwrap_err();
        assert_matches!(error, CompileError::MisplacedBranch { .. });
    }

    #[test]
    fn test_translate_needs_no_closer() {
        let program = compile("{{ translate greeting.hello }}").unwrap();
        assert_eq!(program.len(), 1);

        // But a symmetric closer is accepted
        let program = compile("{{ translate greeting.hello }}{{ /translate }}").unwrap();
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn test_strict_mode_rejects_unknown_roots() {
        let error = compile_with(
            "{{ user.name }}",
            CompileOptions::strict(vec![]),
        )
        .unwrap_err();
        assert_eq!(error.kind(), CompileErrorKind::UnresolvedVariablePath);
        assert_matches!(
            error,
            CompileError::UnresolvedVariablePath { root, .. } if root == "user"
        );
    }

    #[test]
    fn test_strict_mode_accepts_declared_and_bound_roots() {
        let source =
            "{{ for user in users }}{{ user.name }} {{ loop.index }}{{ endfor }}{{ title ?? 'Untitled' }}";
        let program = compile_with(
            source,
            CompileOptions::strict(vec!["users".to_string()]),
        )
        .unwrap();

        assert!(program.strict_variables);
        program.validate().unwrap();
    }

    #[test]
    fn test_strict_mode_checks_loop_iterables() {
        let error = compile_with(
            "{{ for user in users }}{{ endfor }}",
            CompileOptions::strict(vec![]),
        )
        .unwrap_err();
        assert_matches!(
            error,
            CompileError::UnresolvedVariablePath { root, .. } if root == "users"
        );
    }

    #[test]
    fn test_strict_mode_scopes_bindings_to_the_construct() {
        // `user` is no longer bound after the loop closes
        let error = compile_with(
            "{{ for user in users }}{{ endfor }}{{ user.name }}",
            CompileOptions::strict(vec!["users".to_string()]),
        )
        .unwrap_err();
        assert_matches!(
            error,
            CompileError::UnresolvedVariablePath { root, .. } if root == "user"
        );
    }

    #[test]
    fn test_form_binds_entity_root_in_strict_mode() {
        let program = compile_with(
            "{{ form user }}{{ user.email }}{{ endform }}",
            CompileOptions::strict(vec![]),
        )
        .unwrap();
        program.validate().unwrap();
    }

    #[test]
    fn test_options_from_preferences() {
        let preferences = crate::config::runtime::CompilerPreferences {
            strict_variables: true,
            known_roots: vec!["users".to_string()],
        };

        let options = CompileOptions::from_preferences(&preferences);
        assert_eq!(options.variable_mode, VariableMode::Strict);
        assert_eq!(options.known_roots, vec!["users"]);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let source = "{{ if a }}{{ for x in items }}{{ x }}{{ endfor }}{{ else }}none{{ endif }}";
        let first = compile(source).unwrap();
        let second = compile(source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nesting_depth_limit() {
        let mut source = String::new();
        for _ in 0..(MAX_NESTING_DEPTH + 1) {
            source.push_str("{{ if a }}");
        }
        let error = compile(&source).unwrap_err();
        assert_matches!(error, CompileError::NestingTooDeep { .. });
    }
}
