//! Render engine
//!
//! A program-counter interpreter over the compiled instruction sequence.
//! Jump targets were backpatched at compile time, so the engine never
//! scans for matching ends: loops jump back to their start, failed
//! branches jump to their alternate, and a guarded loop whose iterable is
//! missing jumps past its body entirely.
//!
//! All state lives in one `RenderState` per render call; nothing persists
//! or leaks between renders.

use crate::context::RenderContext;
use crate::error::RenderError;
use crate::loops::LoopContext;
use crate::value::Value;
use std::collections::BTreeMap;
use weft_compiler::ir::{CmpOp, Cond, Instr, Operand, Program, Segment, VarRef};
use weft_compiler::log_debug;

/// Rendered output: the body plus every captured section under its name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutput {
    pub body: String,
    pub sections: BTreeMap<String, String>,
}

/// Executes one compiled program, once per render invocation
#[derive(Debug)]
pub struct Renderer<'p> {
    program: &'p Program,
}

impl<'p> Renderer<'p> {
    /// Wrap a compiled program, revalidating its jump targets so a
    /// hand-built or deserialized program cannot derail the interpreter.
    pub fn new(program: &'p Program) -> Result<Self, RenderError> {
        program.validate()?;
        Ok(Self { program })
    }

    /// Render against a context. Re-entrant: each call builds fresh state.
    pub fn render(&self, context: &RenderContext) -> Result<RenderOutput, RenderError> {
        log_debug!("Starting render",
            "instructions" => self.program.len(),
            "strict" => self.program.strict_variables
        );

        let mut state = RenderState::new(self.program.strict_variables);
        state.run(&self.program.instrs, context)?;
        Ok(state.finish())
    }
}

/// Iteration state for one active loop, aligned with the context chain
struct LoopFrame {
    binding: String,
    entries: Vec<(Value, Value)>,
    pos: usize,
}

struct RenderState {
    strict: bool,
    scopes: Vec<BTreeMap<String, Value>>,
    loop_ctx: Option<Box<LoopContext>>,
    loop_frames: Vec<LoopFrame>,
    /// Output buffers; index 0 is the body, the rest are section captures
    buffers: Vec<String>,
    section_names: Vec<String>,
    sections: BTreeMap<String, String>,
    form_scopes: usize,
}

impl RenderState {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            scopes: Vec::new(),
            loop_ctx: None,
            loop_frames: Vec::new(),
            buffers: vec![String::new()],
            section_names: Vec::new(),
            sections: BTreeMap::new(),
            form_scopes: 0,
        }
    }

    fn finish(mut self) -> RenderOutput {
        RenderOutput {
            body: std::mem::take(&mut self.buffers[0]),
            sections: self.sections,
        }
    }

    fn run(&mut self, instrs: &[Instr], context: &RenderContext) -> Result<(), RenderError> {
        let mut pc = 0usize;

        while let Some(instr) = instrs.get(pc) {
            match instr {
                Instr::Literal(text) => {
                    self.emit(text);
                    pc += 1;
                }

                Instr::Output(var) => {
                    let value = self.resolve_output(var, context)?;
                    let text = value.render_string();
                    self.emit(&text);
                    pc += 1;
                }

                Instr::Branch { cond, else_target } => {
                    if self.eval_cond(cond, context) {
                        pc += 1;
                    } else {
                        pc = *else_target;
                    }
                }

                Instr::Jump { target } => {
                    pc = *target;
                }

                Instr::BranchEnd => {
                    pc += 1;
                }

                Instr::LoopStart {
                    binding,
                    iterable,
                    end_target,
                } => {
                    // Existence guard: a missing, empty, or non-iterable
                    // value renders as an empty loop, never a fault
                    let entries = iteration_entries(self.resolve_lenient(iterable, context));
                    if entries.is_empty() {
                        pc = *end_target;
                        continue;
                    }

                    let (first_key, first_value) = entries[0].clone();
                    let parent = self.loop_ctx.take();
                    self.loop_ctx = Some(Box::new(LoopContext::enter(
                        entries.len() as i64,
                        first_key,
                        parent,
                    )));
                    self.scopes
                        .push(BTreeMap::from([(binding.clone(), first_value)]));
                    self.loop_frames.push(LoopFrame {
                        binding: binding.clone(),
                        entries,
                        pos: 0,
                    });
                    pc += 1;
                }

                Instr::LoopEnd { start_target } => {
                    let frame = self
                        .loop_frames
                        .last_mut()
                        .ok_or_else(|| RenderError::malformed(pc, "loop end without a loop"))?;

                    frame.pos += 1;
                    if frame.pos < frame.entries.len() {
                        let (key, value) = frame.entries[frame.pos].clone();
                        let binding = frame.binding.clone();

                        self.loop_ctx
                            .as_mut()
                            .ok_or_else(|| RenderError::malformed(pc, "loop context missing"))?
                            .advance(key);
                        if let Some(scope) = self.scopes.last_mut() {
                            scope.insert(binding, value);
                        }
                        pc = *start_target + 1;
                    } else {
                        self.loop_frames.pop();
                        self.scopes.pop();
                        let ctx = self
                            .loop_ctx
                            .take()
                            .ok_or_else(|| RenderError::malformed(pc, "loop context missing"))?;
                        self.loop_ctx = ctx.exit();
                        pc += 1;
                    }
                }

                Instr::SectionStart { name } => {
                    self.buffers.push(String::new());
                    self.section_names.push(name.clone());
                    pc += 1;
                }

                Instr::SectionEnd => {
                    let name = self
                        .section_names
                        .pop()
                        .ok_or_else(|| RenderError::malformed(pc, "section end without a section"))?;
                    let captured = self
                        .buffers
                        .pop()
                        .filter(|_| !self.buffers.is_empty())
                        .ok_or_else(|| RenderError::malformed(pc, "section buffer missing"))?;

                    // Sections render inline and are captured for host reuse
                    self.emit(&captured);
                    self.sections.insert(name, captured);
                    pc += 1;
                }

                Instr::FormStart { entity } => {
                    let fields = context.entity(entity).cloned().unwrap_or(Value::Null);
                    self.scopes
                        .push(BTreeMap::from([(entity.clone(), fields)]));
                    self.form_scopes += 1;
                    pc += 1;
                }

                Instr::FormEnd => {
                    if self.form_scopes == 0 {
                        return Err(RenderError::malformed(pc, "form end without a form"));
                    }
                    self.form_scopes -= 1;
                    self.scopes.pop();
                    pc += 1;
                }

                Instr::Translate { key, args } => {
                    // A missing key renders the key itself
                    let mut text = match context.translation(key) {
                        Some(localized) => localized.to_string(),
                        None => key.clone(),
                    };
                    for (i, arg) in args.iter().enumerate() {
                        let value = self.resolve_output(arg, context)?;
                        text = text.replace(&format!("{{{}}}", i), &value.render_string());
                    }
                    self.emit(&text);
                    pc += 1;
                }
            }
        }

        if self.buffers.len() != 1 {
            return Err(RenderError::malformed(
                instrs.len(),
                "section capture left open",
            ));
        }

        Ok(())
    }

    fn emit(&mut self, text: &str) {
        if let Some(buffer) = self.buffers.last_mut() {
            buffer.push_str(text);
        }
    }

    /// Value-access resolution: fallback on miss, then strict-mode error,
    /// then null
    fn resolve_output(&self, var: &VarRef, context: &RenderContext) -> Result<Value, RenderError> {
        match self.lookup(var, context) {
            Some(value) => Ok(value),
            None => {
                if let Some(fallback) = &var.fallback {
                    return Ok(Value::from(fallback));
                }
                if self.strict {
                    return Err(RenderError::UnresolvedVariable {
                        path: var.to_string(),
                    });
                }
                Ok(Value::Null)
            }
        }
    }

    /// Existence-test resolution: a miss is null, never an error. Used by
    /// conditionals and loop guards, which are themselves the existence
    /// checks.
    fn resolve_lenient(&self, var: &VarRef, context: &RenderContext) -> Value {
        match self.lookup(var, context) {
            Some(value) => value,
            None => var
                .fallback
                .as_ref()
                .map(Value::from)
                .unwrap_or(Value::Null),
        }
    }

    fn lookup(&self, var: &VarRef, context: &RenderContext) -> Option<Value> {
        let mut segments = var.segments.iter();
        let root = match segments.next()? {
            Segment::Member(name) => name,
            _ => return None,
        };

        let mut current = if root == "loop" {
            self.loop_ctx.as_ref()?.meta_value()
        } else {
            self.scope_value(root)
                .or_else(|| context.root_value(root).cloned())?
        };

        for segment in segments {
            current = match segment {
                Segment::Member(name) => current.get_member(name)?.clone(),
                Segment::Index(index) => current.get_index(*index)?.clone(),
                Segment::Key(key) => current.get_member(key)?.clone(),
            };
        }

        Some(current)
    }

    fn scope_value(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    fn eval_cond(&self, cond: &Cond, context: &RenderContext) -> bool {
        let lhs = self.operand_value(&cond.lhs, context);
        match &cond.cmp {
            None => lhs.is_truthy(),
            Some((op, rhs)) => compare(&lhs, *op, &self.operand_value(rhs, context)),
        }
    }

    fn operand_value(&self, operand: &Operand, context: &RenderContext) -> Value {
        match operand {
            Operand::Lit(lit) => Value::from(lit),
            Operand::Path(var) => self.resolve_lenient(var, context),
        }
    }
}

fn iteration_entries(value: Value) -> Vec<(Value, Value)> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (Value::Int(i as i64), item))
            .collect(),
        Value::Map(entries) => entries
            .into_iter()
            .map(|(key, item)| (Value::Str(key), item))
            .collect(),
        _ => Vec::new(),
    }
}

/// Comparison semantics: numeric when both sides are numeric, lexicographic
/// for strings, structural equality otherwise; orderings between unrelated
/// types are false.
fn compare(lhs: &Value, op: CmpOp, rhs: &Value) -> bool {
    if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
        return match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Gt => a > b,
            CmpOp::Lt => a < b,
            CmpOp::Ge => a >= b,
            CmpOp::Le => a <= b,
        };
    }

    match (op, lhs, rhs) {
        (CmpOp::Eq, _, _) => lhs == rhs,
        (CmpOp::Ne, _, _) => lhs != rhs,
        (CmpOp::Gt, Value::Str(a), Value::Str(b)) => a > b,
        (CmpOp::Lt, Value::Str(a), Value::Str(b)) => a < b,
        (CmpOp::Ge, Value::Str(a), Value::Str(b)) => a >= b,
        (CmpOp::Le, Value::Str(a), Value::Str(b)) => a <= b,
        _ => false,
    }
}
