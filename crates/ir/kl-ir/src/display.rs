//! Textual rendering in an LLVM-like assembly syntax

use crate::function::Function;
use crate::instr::{InstKind, Instruction, Terminator};
use crate::module::{Global, Module};
use crate::types::IrType;
use crate::value::{Constant, FuncId, Operand, ValueId};
use indexmap::IndexMap;
use std::fmt::{self, Write as _};

/// Text of one function, `None` for an unknown id
pub fn function_text(module: &Module, id: FuncId) -> Option<String> {
    let function = module.function(id)?;
    let mut out = String::new();
    Printer { module, function }.function(&mut out).ok()?;
    Some(out)
}

fn named_structs(module: &Module) -> IndexMap<String, String> {
    let mut named = IndexMap::new();
    let mut visit = |ty: &IrType| collect_named(ty, &mut named);
    for (_, function) in module.functions() {
        for param in &function.ty.params {
            visit(param);
        }
        visit(function.ty.ret.as_ref());
        for value in &function.values {
            visit(&value.ty);
        }
        for inst in function.instructions() {
            match &inst.kind {
                InstKind::Alloca { ty } | InstKind::Load { ty, .. } => visit(ty),
                _ => {}
            }
            for operand in inst.kind.operands() {
                if let Operand::Constant(constant) = operand {
                    visit(&constant.ty());
                }
            }
        }
    }
    named
}

fn collect_named(ty: &IrType, named: &mut IndexMap<String, String>) {
    match ty {
        IrType::Struct(st) => {
            for field in &st.fields {
                collect_named(field, named);
            }
            if let Some(name) = &st.name {
                named.entry(name.clone()).or_insert_with(|| st.body());
            }
        }
        IrType::Array { element, .. } => collect_named(element, named),
        IrType::Function(sig) => {
            for param in &sig.params {
                collect_named(param, named);
            }
            collect_named(&sig.ret, named);
        }
        IrType::Void | IrType::Bool | IrType::Int(_) | IrType::Double | IrType::Ptr => {}
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name())?;

        let named = named_structs(self);
        if !named.is_empty() {
            writeln!(f)?;
            for (name, body) in &named {
                writeln!(f, "%{name} = type {body}")?;
            }
        }

        if !self.globals().is_empty() {
            writeln!(f)?;
            for global in self.globals() {
                writeln!(f, "{}", GlobalLine(global))?;
            }
        }

        for (_, function) in self.functions() {
            writeln!(f)?;
            let mut text = String::new();
            Printer {
                module: self,
                function,
            }
            .function(&mut text)?;
            f.write_str(&text)?;
        }
        Ok(())
    }
}

struct GlobalLine<'ir>(&'ir Global);

impl fmt::Display for GlobalLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let global = self.0;
        let kind = if global.constant { "constant" } else { "global" };
        write!(f, "@{} = private {kind} {} c\"", global.name, global.ty())?;
        for &byte in &global.bytes {
            if (byte.is_ascii_graphic() && byte != b'"' && byte != b'\\') || byte == b' ' {
                f.write_char(char::from(byte))?;
            } else {
                write!(f, "\\{byte:02X}")?;
            }
        }
        f.write_char('"')
    }
}

struct Printer<'ir> {
    module: &'ir Module,
    function: &'ir Function,
}

impl Printer<'_> {
    fn function(&self, out: &mut String) -> fmt::Result {
        let function = self.function;
        let ret = function.return_type();

        if function.is_declaration() {
            let params = function
                .ty
                .params
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            return writeln!(out, "declare {ret} @{}({})", function.name, params.join(", "));
        }

        let params = function
            .params()
            .iter()
            .zip(&function.ty.params)
            .map(|(value, ty)| format!("{ty} {}", self.value(*value)))
            .collect::<Vec<_>>();
        writeln!(out, "define {ret} @{}({}) {{", function.name, params.join(", "))?;

        for (index, block) in function.blocks().iter().enumerate() {
            if index > 0 {
                writeln!(out)?;
            }
            writeln!(out, "{}:", block.name)?;
            for inst in &block.instructions {
                writeln!(out, "  {}", self.instruction(inst))?;
            }
            if let Some(terminator) = &block.terminator {
                writeln!(out, "  {}", self.terminator(terminator))?;
            }
        }
        writeln!(out, "}}")
    }

    fn value(&self, id: ValueId) -> String {
        self.function
            .value(id)
            .and_then(|data| data.name.as_deref())
            .map_or_else(|| id.to_string(), |name| format!("%{name}"))
    }

    fn function_name(&self, id: FuncId) -> String {
        self.module
            .function(id)
            .map_or_else(|| format!("@{id}"), |function| format!("@{}", function.name))
    }

    fn constant(&self, constant: &Constant) -> String {
        match constant {
            Constant::Bool(value) => value.to_string(),
            Constant::Int { value, .. } => value.to_string(),
            Constant::Double(value) => format!("{value:?}"),
            Constant::Struct { fields, .. } => {
                let fields = fields
                    .iter()
                    .map(|field| format!("{} {}", field.ty(), self.constant(field)))
                    .collect::<Vec<_>>();
                format!("{{ {} }}", fields.join(", "))
            }
            Constant::Global(id) => self
                .module
                .global(*id)
                .map_or_else(|| format!("@{id}"), |global| format!("@{}", global.name)),
            Constant::Undef(_) => "undef".to_owned(),
        }
    }

    fn operand(&self, operand: &Operand) -> String {
        match operand {
            Operand::Value(id) => self.value(*id),
            Operand::Constant(constant) => self.constant(constant),
            Operand::Function(id) => self.function_name(*id),
        }
    }

    fn typed(&self, operand: &Operand) -> String {
        let ty = self
            .function
            .operand_type(operand)
            .map_or_else(|| "?".to_owned(), |ty| ty.to_string());
        format!("{ty} {}", self.operand(operand))
    }

    fn instruction(&self, inst: &Instruction) -> String {
        let body = match &inst.kind {
            InstKind::Alloca { ty } => format!("alloca {ty}"),
            InstKind::Load { ty, ptr } => format!("load {ty}, {}", self.typed(ptr)),
            InstKind::Store { value, ptr } => {
                format!("store {}, {}", self.typed(value), self.typed(ptr))
            }
            InstKind::FAdd { lhs, rhs } => {
                format!("fadd {}, {}", self.typed(lhs), self.operand(rhs))
            }
            InstKind::Call { callee, args } => {
                let ret = self
                    .module
                    .function(*callee)
                    .map_or_else(|| "?".to_owned(), |target| target.return_type().to_string());
                let args = args
                    .iter()
                    .map(|arg| self.typed(arg))
                    .collect::<Vec<_>>();
                format!("call {ret} {}({})", self.function_name(*callee), args.join(", "))
            }
        };
        let Some(result) = inst.result else {
            return body;
        };
        format!("{} = {body}", self.value(result))
    }

    fn terminator(&self, terminator: &Terminator) -> String {
        let label = |block| {
            self.function
                .block(block)
                .map_or_else(|| format!("%{block}"), |data| format!("%{}", data.name))
        };
        match terminator {
            Terminator::Br { target } => format!("br label {}", label(*target)),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => format!(
                "br {}, label {}, label {}",
                self.typed(cond),
                label(*then_block),
                label(*else_block)
            ),
            Terminator::Ret { value: Some(value) } => format!("ret {}", self.typed(value)),
            Terminator::Ret { value: None } => "ret void".to_owned(),
            Terminator::Unreachable => "unreachable".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::FunctionBuilder;
    use crate::function::Function;
    use crate::module::Module;
    use crate::types::{FunctionType, IrType, StructType};
    use crate::value::Constant;
    use expect_test::expect;

    #[test]
    fn test_print_module() {
        let mut module = Module::new("demo");
        let add_ty = FunctionType::new(vec![IrType::Double], IrType::Double);
        let add = module.declare_function("add", add_ty.clone()).unwrap();
        let text_ty = FunctionType::new(vec![], IrType::string());
        let text = module.declare_function("text", text_ty.clone()).unwrap();
        let puts_ty = FunctionType::new(vec![IrType::string()], IrType::Void);
        module.declare_function("puts", puts_ty).unwrap();

        let mut builder = FunctionBuilder::new(Function::new("add", add_ty));
        let entry = builder.append_block("entry");
        builder.position_at_end(entry).unwrap();
        let x = builder.param(0).unwrap();
        builder.set_value_name(x, "x").unwrap();
        let slot = builder.build_entry_alloca(IrType::Double, "y").unwrap();
        builder.build_store(x, slot).unwrap();
        let loaded = builder.build_load(IrType::Double, slot).unwrap();
        let sum = builder.build_fadd(loaded, Constant::Double(1.0)).unwrap();
        builder.build_return(Some(sum.into())).unwrap();
        module.define_function(add, builder.finish()).unwrap();

        let bytes = module.add_string_constant(b"a\"b\n");
        let mut builder = FunctionBuilder::new(Function::new("text", text_ty));
        let entry = builder.append_block("entry");
        builder.position_at_end(entry).unwrap();
        let value = Constant::Struct {
            ty: StructType::named("string", vec![IrType::Ptr, IrType::Int(32)]),
            fields: vec![
                Constant::Global(bytes),
                Constant::Int { bits: 32, value: 4 },
            ],
        };
        builder.build_return(Some(value.into())).unwrap();
        module.define_function(text, builder.finish()).unwrap();

        expect![[r#"
            ; ModuleID = 'demo'

            %string = type { ptr, i32 }

            @.str = private constant [4 x i8] c"a\22b\0A"

            define double @add(double %x) {
            entry:
              %y = alloca double
              store double %x, ptr %y
              %2 = load double, ptr %y
              %3 = fadd double %2, 1.0
              ret double %3
            }

            define %string @text() {
            entry:
              ret %string { ptr @.str, i32 4 }
            }

            declare void @puts(%string)
        "#]]
        .assert_eq(&module.to_string());
    }
}
