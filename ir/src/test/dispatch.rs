use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::expr::IrRef;
use crate::functor::{DispatchGuard, IrFunctor};
use crate::nodes::{Add, Evaluate, IntImm, Mul, Sub, Variable};
use crate::{Expr, Type};

fn int32(v: i64) -> Expr {
    IntImm::make(Type::int(32), v)
}

/// A toy dispatch family: name the node's operator into a string context.
type NameFn = fn(IrRef<'_>, &mut Vec<&'static str>);

#[test]
fn functor_dispatches_by_kind() {
    let mut table: IrFunctor<NameFn> = IrFunctor::new();
    table
        .set_dispatch::<Add>(|_, out| out.push("add"))
        .set_dispatch::<Mul>(|_, out| out.push("mul"));

    let sum = Add::make(int32(1), int32(2));
    let product = Mul::make(int32(1), int32(2));

    assert!(table.can_dispatch(IrRef::Expr(&sum)));

    let mut names = Vec::new();
    table.dispatch(IrRef::Expr(&sum), &mut names);
    table.dispatch(IrRef::Expr(&product), &mut names);
    assert_eq!(names, vec!["add", "mul"]);
}

#[test]
#[should_panic(expected = "un-registered function on type Sub")]
fn missing_dispatch_names_the_kind() {
    let mut table: IrFunctor<NameFn> = IrFunctor::new();
    table.set_dispatch::<Add>(|_, out| out.push("add"));

    let difference = Sub::make(int32(1), int32(2));
    let mut names = Vec::new();
    table.dispatch(IrRef::Expr(&difference), &mut names);
}

#[test]
#[should_panic(expected = "Dispatch for Add is already set")]
fn double_registration_is_rejected() {
    let mut table: IrFunctor<NameFn> = IrFunctor::new();
    table.set_dispatch::<Add>(|_, out| out.push("add"));
    table.set_dispatch::<Add>(|_, out| out.push("other"));
}

#[test]
fn clear_dispatch_allows_re_registration() {
    let mut table: IrFunctor<NameFn> = IrFunctor::new();
    table.set_dispatch::<Add>(|_, out| out.push("add"));
    table.clear_dispatch::<Add>();
    table.set_dispatch::<Add>(|_, out| out.push("replacement"));

    let sum = Add::make(int32(1), int32(2));
    let mut names = Vec::new();
    table.dispatch(IrRef::Expr(&sum), &mut names);
    assert_eq!(names, vec!["replacement"]);
}

static PLUGIN_TABLE: LazyLock<RwLock<IrFunctor<NameFn>>> =
    LazyLock::new(|| RwLock::new(IrFunctor::new()));

#[test]
fn dispatch_guard_unregisters_on_drop() {
    let sum = Add::make(int32(1), int32(2));
    let x: Expr = Variable::make(Type::int(32), "x").into();

    {
        let mut guard = DispatchGuard::new();
        guard
            .set_dispatch::<Add, NameFn>(&PLUGIN_TABLE, |_, out| {
                out.push("plugin add")
            })
            .set_dispatch::<Variable, NameFn>(&PLUGIN_TABLE, |_, out| {
                out.push("plugin var")
            });

        let table = PLUGIN_TABLE.read();
        assert!(table.can_dispatch(IrRef::Expr(&sum)));
        assert!(table.can_dispatch(IrRef::Expr(&x)));
    }

    // Guard dropped: the plugin's callbacks are gone.
    let table = PLUGIN_TABLE.read();
    assert!(!table.can_dispatch(IrRef::Expr(&sum)));
    assert!(!table.can_dispatch(IrRef::Expr(&x)));
}

#[test]
fn statements_dispatch_through_the_same_table() {
    let mut table: IrFunctor<NameFn> = IrFunctor::new();
    table.set_dispatch::<Evaluate>(|_, out| out.push("evaluate"));

    let s = Evaluate::make(int32(1));
    let mut names = Vec::new();
    table.dispatch(IrRef::Stmt(&s), &mut names);
    assert_eq!(names, vec!["evaluate"]);
}
