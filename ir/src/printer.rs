//! The pretty-printer.
//!
//! Rendering is driven by a global [`IrFunctor`] dispatch table with one
//! callback per node kind, registered when the table is first touched, so
//! plugins can add printers for their own kinds (scoped through
//! [`crate::functor::DispatchGuard`] against [`print_vtable`]). The emitted
//! form is the canonical human-readable one; it does not round-trip.

use std::fmt::{self, Write};
use std::sync::LazyLock;

use mirage_base::internal_error;
use parking_lot::RwLock;

use crate::expr::{Expr, ExprNodeKind, IrRef, Stmt, StmtNodeKind, VarExpr};
use crate::functor::IrFunctor;
use crate::helpers::is_one;
use crate::nodes::*;

/// Callback type of the printing dispatch family.
pub type PrintFn = fn(IrRef<'_>, &mut IrPrinter<'_>) -> fmt::Result;

static PRINT_VTABLE: LazyLock<RwLock<IrFunctor<PrintFn>>> =
    LazyLock::new(|| RwLock::new(build_default_table()));

/// The printing dispatch table. Extend it for new kinds through a
/// `DispatchGuard` so the registration is unwound with its owner.
pub fn print_vtable() -> &'static RwLock<IrFunctor<PrintFn>> {
    &PRINT_VTABLE
}

/// Streams IR in its textual form. Indentation is a scoped two-space
/// counter maintained by the statement callbacks.
pub struct IrPrinter<'a> {
    pub stream: &'a mut dyn Write,
    pub indent: usize,
}

impl<'a> IrPrinter<'a> {
    pub fn new(stream: &'a mut dyn Write) -> Self {
        Self { stream, indent: 0 }
    }

    pub fn print_expr(&mut self, e: &Expr) -> fmt::Result {
        let f = *print_vtable().read().get(IrRef::Expr(e));
        f(IrRef::Expr(e), self)
    }

    pub fn print_stmt(&mut self, s: &Stmt) -> fmt::Result {
        let f = *print_vtable().read().get(IrRef::Stmt(s));
        f(IrRef::Stmt(s), self)
    }

    pub fn do_indent(&mut self) -> fmt::Result {
        for _ in 0..self.indent {
            self.stream.write_char(' ')?;
        }
        Ok(())
    }
}

fn expr_op<'a, T: ExprNodeKind>(n: IrRef<'a>) -> (&'a T, &'a Expr) {
    if let IrRef::Expr(e) = n {
        if let Some(op) = e.as_node::<T>() {
            return (op, e);
        }
    }
    internal_error!(
        "printer callback for {} dispatched on the wrong node",
        T::TYPE_KEY
    )
}

fn stmt_op<'a, T: StmtNodeKind>(n: IrRef<'a>) -> (&'a T, &'a Stmt) {
    if let IrRef::Stmt(s) = n {
        if let Some(op) = s.as_node::<T>() {
            return (op, s);
        }
    }
    internal_error!(
        "printer callback for {} dispatched on the wrong node",
        T::TYPE_KEY
    )
}

fn print_infix(
    p: &mut IrPrinter<'_>,
    a: &Expr,
    infix: &str,
    b: &Expr,
) -> fmt::Result {
    p.stream.write_char('(')?;
    p.print_expr(a)?;
    p.stream.write_str(infix)?;
    p.print_expr(b)?;
    p.stream.write_char(')')
}

fn print_call_form(
    p: &mut IrPrinter<'_>,
    name: &str,
    args: &[Expr],
) -> fmt::Result {
    write!(p.stream, "{name}(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            p.stream.write_str(", ")?;
        }
        p.print_expr(arg)?;
    }
    p.stream.write_char(')')
}

fn build_default_table() -> IrFunctor<PrintFn> {
    let mut table: IrFunctor<PrintFn> = IrFunctor::new();

    table.set_dispatch::<IntImm>(|n, p| {
        let (op, e) = expr_op::<IntImm>(n);
        if e.ty() == crate::Type::int(32) {
            write!(p.stream, "{}", op.value)
        } else {
            write!(p.stream, "({}){}", e.ty(), op.value)
        }
    });
    table.set_dispatch::<UIntImm>(|n, p| {
        let (op, e) = expr_op::<UIntImm>(n);
        write!(p.stream, "({}){}", e.ty(), op.value)
    });
    table.set_dispatch::<FloatImm>(|n, p| {
        let (op, e) = expr_op::<FloatImm>(n);
        match e.ty().bits() {
            64 => write!(p.stream, "{:.6}", op.value),
            32 => write!(p.stream, "{:.6}f", op.value),
            16 => write!(p.stream, "{:.6}h", op.value),
            _ => internal_error!("Bad bit-width for float: {}", e.ty()),
        }
    });
    table.set_dispatch::<StringImm>(|n, p| {
        let (op, _) = expr_op::<StringImm>(n);
        p.stream.write_char('"')?;
        for c in op.value.bytes() {
            if (b' '..=b'~').contains(&c) && c != b'\\' && c != b'"' {
                p.stream.write_char(c as char)?;
            } else {
                p.stream.write_char('\\')?;
                match c {
                    b'"' => p.stream.write_char('"')?,
                    b'\\' => p.stream.write_char('\\')?,
                    b'\t' => p.stream.write_char('t')?,
                    b'\r' => p.stream.write_char('r')?,
                    b'\n' => p.stream.write_char('n')?,
                    _ => write!(p.stream, "x{c:02X}")?,
                }
            }
        }
        p.stream.write_char('"')
    });
    table.set_dispatch::<Cast>(|n, p| {
        let (op, e) = expr_op::<Cast>(n);
        write!(p.stream, "{}(", e.ty())?;
        p.print_expr(&op.value)?;
        p.stream.write_char(')')
    });
    table.set_dispatch::<Variable>(|n, p| {
        let (op, _) = expr_op::<Variable>(n);
        p.stream.write_str(&op.name_hint)
    });
    table.set_dispatch::<Add>(|n, p| {
        let (op, _) = expr_op::<Add>(n);
        print_infix(p, &op.a, " + ", &op.b)
    });
    table.set_dispatch::<Sub>(|n, p| {
        let (op, _) = expr_op::<Sub>(n);
        print_infix(p, &op.a, " - ", &op.b)
    });
    table.set_dispatch::<Mul>(|n, p| {
        let (op, _) = expr_op::<Mul>(n);
        print_infix(p, &op.a, "*", &op.b)
    });
    table.set_dispatch::<Div>(|n, p| {
        let (op, _) = expr_op::<Div>(n);
        print_infix(p, &op.a, "/", &op.b)
    });
    table.set_dispatch::<Mod>(|n, p| {
        let (op, _) = expr_op::<Mod>(n);
        print_infix(p, &op.a, " % ", &op.b)
    });
    table.set_dispatch::<Min>(|n, p| {
        let (op, _) = expr_op::<Min>(n);
        p.stream.write_str("min(")?;
        p.print_expr(&op.a)?;
        p.stream.write_str(", ")?;
        p.print_expr(&op.b)?;
        p.stream.write_char(')')
    });
    table.set_dispatch::<Max>(|n, p| {
        let (op, _) = expr_op::<Max>(n);
        p.stream.write_str("max(")?;
        p.print_expr(&op.a)?;
        p.stream.write_str(", ")?;
        p.print_expr(&op.b)?;
        p.stream.write_char(')')
    });
    table.set_dispatch::<EQ>(|n, p| {
        let (op, _) = expr_op::<EQ>(n);
        print_infix(p, &op.a, " == ", &op.b)
    });
    table.set_dispatch::<NE>(|n, p| {
        let (op, _) = expr_op::<NE>(n);
        print_infix(p, &op.a, " != ", &op.b)
    });
    table.set_dispatch::<LT>(|n, p| {
        let (op, _) = expr_op::<LT>(n);
        print_infix(p, &op.a, " < ", &op.b)
    });
    table.set_dispatch::<LE>(|n, p| {
        let (op, _) = expr_op::<LE>(n);
        print_infix(p, &op.a, " <= ", &op.b)
    });
    table.set_dispatch::<GT>(|n, p| {
        let (op, _) = expr_op::<GT>(n);
        print_infix(p, &op.a, " > ", &op.b)
    });
    table.set_dispatch::<GE>(|n, p| {
        let (op, _) = expr_op::<GE>(n);
        print_infix(p, &op.a, " >= ", &op.b)
    });
    table.set_dispatch::<And>(|n, p| {
        let (op, _) = expr_op::<And>(n);
        print_infix(p, &op.a, " && ", &op.b)
    });
    table.set_dispatch::<Or>(|n, p| {
        let (op, _) = expr_op::<Or>(n);
        print_infix(p, &op.a, " || ", &op.b)
    });
    table.set_dispatch::<Not>(|n, p| {
        let (op, _) = expr_op::<Not>(n);
        p.stream.write_char('!')?;
        p.print_expr(&op.a)
    });
    table.set_dispatch::<Select>(|n, p| {
        let (op, _) = expr_op::<Select>(n);
        p.stream.write_str("select(")?;
        p.print_expr(&op.condition)?;
        p.stream.write_str(", ")?;
        p.print_expr(&op.true_value)?;
        p.stream.write_str(", ")?;
        p.print_expr(&op.false_value)?;
        p.stream.write_char(')')
    });
    table.set_dispatch::<Load>(|n, p| {
        let (op, _) = expr_op::<Load>(n);
        write!(p.stream, "{}[", op.buffer_var.name())?;
        p.print_expr(&op.index)?;
        p.stream.write_char(']')?;
        if !is_one(&op.predicate) {
            p.stream.write_str(" if ")?;
            p.print_expr(&op.predicate)?;
        }
        Ok(())
    });
    table.set_dispatch::<Ramp>(|n, p| {
        let (op, _) = expr_op::<Ramp>(n);
        p.stream.write_str("ramp(")?;
        p.print_expr(&op.base)?;
        p.stream.write_str(", ")?;
        p.print_expr(&op.stride)?;
        write!(p.stream, ", {})", op.lanes)
    });
    table.set_dispatch::<Broadcast>(|n, p| {
        let (op, _) = expr_op::<Broadcast>(n);
        write!(p.stream, "x{}(", op.lanes)?;
        p.print_expr(&op.value)?;
        p.stream.write_char(')')
    });
    table.set_dispatch::<Call>(|n, p| {
        let (op, _) = expr_op::<Call>(n);
        // Special-case some intrinsics for readability.
        if op.is_intrinsic(Call::EXTRACT_BUFFER_HOST) {
            p.print_expr(&op.args[0])?;
            return p.stream.write_str(".host");
        } else if op.is_intrinsic(Call::EXTRACT_BUFFER_MIN) {
            p.print_expr(&op.args[0])?;
            p.stream.write_str(".min[")?;
            p.print_expr(&op.args[1])?;
            return p.stream.write_char(']');
        } else if op.is_intrinsic(Call::EXTRACT_BUFFER_MAX) {
            p.print_expr(&op.args[0])?;
            p.stream.write_str(".max[")?;
            p.print_expr(&op.args[1])?;
            return p.stream.write_char(']');
        }
        print_call_form(p, &op.name, &op.args)
    });
    table.set_dispatch::<Let>(|n, p| {
        let (op, _) = expr_op::<Let>(n);
        write!(p.stream, "(let {} = ", op.var.name())?;
        p.print_expr(&op.value)?;
        p.stream.write_str(" in ")?;
        p.print_expr(&op.body)?;
        p.stream.write_char(')')
    });
    table.set_dispatch::<Shuffle>(|n, p| {
        let (op, _) = expr_op::<Shuffle>(n);
        if op.is_interleave() {
            print_call_form(p, "interleave_vectors", &op.vectors)
        } else if op.is_concat() {
            print_call_form(p, "concat_vectors", &op.vectors)
        } else if op.is_extract_element() {
            p.stream.write_str("extract_element(")?;
            p.print_expr(&op.vectors[0])?;
            write!(p.stream, ", {})", op.indices[0])
        } else if op.vectors.len() == 1 && op.is_slice() {
            p.stream.write_str("slice_vectors(")?;
            p.print_expr(&op.vectors[0])?;
            write!(
                p.stream,
                ", {}, {}, {})",
                op.slice_begin(),
                op.slice_stride(),
                op.indices.len()
            )
        } else {
            p.stream.write_str("shuffle(")?;
            for vector in &op.vectors {
                p.print_expr(vector)?;
                p.stream.write_str(", ")?;
            }
            write!(p.stream, "{:?})", op.indices)
        }
    });

    table.set_dispatch::<LetStmt>(|n, p| {
        let (op, _) = stmt_op::<LetStmt>(n);
        p.do_indent()?;
        write!(p.stream, "let {} = ", op.var.name())?;
        p.print_expr(&op.value)?;
        p.stream.write_char('\n')?;
        p.print_stmt(&op.body)
    });
    table.set_dispatch::<AttrStmt>(|n, p| {
        let (op, _) = stmt_op::<AttrStmt>(n);
        p.do_indent()?;
        p.stream.write_str("// attr [")?;
        p.print_expr(&op.node)?;
        write!(p.stream, "] {} = ", op.attr_key)?;
        p.print_expr(&op.value)?;
        p.stream.write_char('\n')?;
        p.print_stmt(&op.body)
    });
    table.set_dispatch::<AssertStmt>(|n, p| {
        let (op, _) = stmt_op::<AssertStmt>(n);
        p.do_indent()?;
        p.stream.write_str("assert(")?;
        p.print_expr(&op.condition)?;
        p.stream.write_str(", ")?;
        p.print_expr(&op.message)?;
        p.stream.write_str(")\n")
    });
    table.set_dispatch::<ProducerConsumer>(|n, p| {
        let (op, _) = stmt_op::<ProducerConsumer>(n);
        if op.is_producer {
            p.do_indent()?;
            writeln!(p.stream, "produce {} {{", op.name)?;
            p.indent += 2;
            p.print_stmt(&op.body)?;
            p.indent -= 2;
            p.do_indent()?;
            p.stream.write_str("}\n")
        } else {
            p.print_stmt(&op.body)
        }
    });
    table.set_dispatch::<For>(|n, p| {
        let (op, _) = stmt_op::<For>(n);
        p.do_indent()?;
        write!(
            p.stream,
            "{}{} ({}, ",
            op.for_type,
            op.device_api,
            op.loop_var.name()
        )?;
        p.print_expr(&op.min)?;
        p.stream.write_str(", ")?;
        p.print_expr(&op.extent)?;
        p.stream.write_str(") {\n")?;
        p.indent += 2;
        p.print_stmt(&op.body)?;
        p.indent -= 2;
        p.do_indent()?;
        p.stream.write_str("}\n")
    });
    table.set_dispatch::<Store>(|n, p| {
        let (op, _) = stmt_op::<Store>(n);
        p.do_indent()?;
        write!(p.stream, "{}[", op.buffer_var.name())?;
        p.print_expr(&op.index)?;
        p.stream.write_str("] = ")?;
        p.print_expr(&op.value)?;
        if !is_one(&op.predicate) {
            p.stream.write_str(" if ")?;
            p.print_expr(&op.predicate)?;
        }
        p.stream.write_char('\n')
    });
    table.set_dispatch::<Provide>(|n, p| {
        let (op, _) = stmt_op::<Provide>(n);
        p.do_indent()?;
        write!(p.stream, "{}(", op.name)?;
        for (i, arg) in op.args.iter().enumerate() {
            if i > 0 {
                p.stream.write_str(", ")?;
            }
            p.print_expr(arg)?;
        }
        p.stream.write_str(") = ")?;
        if op.values.len() > 1 {
            p.stream.write_char('{')?;
        }
        for (i, value) in op.values.iter().enumerate() {
            if i > 0 {
                p.stream.write_str(", ")?;
            }
            p.print_expr(value)?;
        }
        if op.values.len() > 1 {
            p.stream.write_char('}')?;
        }
        p.stream.write_char('\n')
    });
    table.set_dispatch::<Allocate>(|n, p| {
        let (op, _) = stmt_op::<Allocate>(n);
        p.do_indent()?;
        write!(p.stream, "allocate {}[{}", op.buffer_var.name(), op.ty)?;
        for extent in &op.extents {
            p.stream.write_str(" * ")?;
            p.print_expr(extent)?;
        }
        p.stream.write_char(']')?;
        if !is_one(&op.condition) {
            p.stream.write_str(" if ")?;
            p.print_expr(&op.condition)?;
        }
        if let Some(new_expr) = &op.new_expr {
            p.stream.write_str("\n custom_new { ")?;
            p.print_expr(new_expr)?;
            p.stream.write_str(" }")?;
        }
        if !op.free_function.is_empty() {
            write!(
                p.stream,
                "\n custom_delete {{ {}(<args>); }}",
                op.free_function
            )?;
        }
        p.stream.write_char('\n')?;
        p.print_stmt(&op.body)
    });
    table.set_dispatch::<Free>(|n, p| {
        let (op, _) = stmt_op::<Free>(n);
        p.do_indent()?;
        writeln!(p.stream, "free {}", op.buffer_var.name())
    });
    table.set_dispatch::<Realize>(|n, p| {
        let (op, _) = stmt_op::<Realize>(n);
        p.do_indent()?;
        write!(p.stream, "realize {}(", op.name)?;
        for (i, range) in op.bounds.iter().enumerate() {
            if i > 0 {
                p.stream.write_str(", ")?;
            }
            p.stream.write_char('[')?;
            p.print_expr(&range.min)?;
            p.stream.write_str(", ")?;
            p.print_expr(&range.extent)?;
            p.stream.write_char(']')?;
        }
        p.stream.write_char(')')?;
        if !is_one(&op.condition) {
            p.stream.write_str(" if ")?;
            p.print_expr(&op.condition)?;
        }
        p.stream.write_str(" {\n")?;
        p.indent += 2;
        p.print_stmt(&op.body)?;
        p.indent -= 2;
        p.do_indent()?;
        p.stream.write_str("}\n")
    });
    table.set_dispatch::<Prefetch>(|n, p| {
        let (op, _) = stmt_op::<Prefetch>(n);
        p.do_indent()?;
        write!(p.stream, "prefetch {}(", op.name)?;
        for (i, range) in op.bounds.iter().enumerate() {
            if i > 0 {
                p.stream.write_str(", ")?;
            }
            p.stream.write_char('[')?;
            p.print_expr(&range.min)?;
            p.stream.write_str(", ")?;
            p.print_expr(&range.extent)?;
            p.stream.write_char(']')?;
        }
        p.stream.write_str(")\n")
    });
    table.set_dispatch::<Block>(|n, p| {
        let (op, _) = stmt_op::<Block>(n);
        p.print_stmt(&op.first)?;
        p.print_stmt(&op.rest)
    });
    table.set_dispatch::<IfThenElse>(|n, p| {
        let (op, _) = stmt_op::<IfThenElse>(n);
        p.do_indent()?;
        let mut op = op;
        loop {
            p.stream.write_str("if (")?;
            p.print_expr(&op.condition)?;
            p.stream.write_str(") {\n")?;
            p.indent += 2;
            p.print_stmt(&op.then_case)?;
            p.indent -= 2;

            let Some(else_case) = &op.else_case else { break };
            if let Some(nested) = else_case.as_node::<IfThenElse>() {
                p.do_indent()?;
                p.stream.write_str("} else ")?;
                op = nested;
            } else {
                p.do_indent()?;
                p.stream.write_str("} else {\n")?;
                p.indent += 2;
                p.print_stmt(else_case)?;
                p.indent -= 2;
                break;
            }
        }
        p.do_indent()?;
        p.stream.write_str("}\n")
    });
    table.set_dispatch::<Evaluate>(|n, p| {
        let (op, _) = stmt_op::<Evaluate>(n);
        p.do_indent()?;
        p.print_expr(&op.value)?;
        p.stream.write_char('\n')
    });

    table
}

impl fmt::Display for ForType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForType::Serial => f.write_str("for"),
            ForType::Parallel => f.write_str("parallel"),
            ForType::Unrolled => f.write_str("unrolled"),
            ForType::Vectorized => f.write_str("vectorized"),
        }
    }
}

impl fmt::Display for DeviceApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceApi::None | DeviceApi::Host => Ok(()),
            DeviceApi::DefaultGpu => f.write_str("<Default_GPU>"),
            DeviceApi::Cuda => f.write_str("<CUDA>"),
            DeviceApi::OpenCl => f.write_str("<OpenCL>"),
            DeviceApi::Metal => f.write_str("<Metal>"),
            DeviceApi::Hexagon => f.write_str("<Hexagon>"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        IrPrinter::new(f).print_expr(self)
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        IrPrinter::new(f).print_stmt(self)
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for VarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_expr(), f)
    }
}

impl fmt::Debug for VarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_expr(), f)
    }
}
