//! Test-only interpreter for the code model.
//!
//! Executes generated [`Function`]s with C semantics where they matter to the generated code:
//! arrays are passed by reference (so `out` may alias an input), integer division truncates,
//! `float` storage rounds to single precision, and reading an uninitialized local or indexing out
//! of bounds panics instead of being undefined.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    code::{ArrayType, BinOp, Expr, Function, Init, Stmt, Type},
    Library, ScalarKind,
};

/// Recursion limit; the deepest generated call chain is `inverse -> minor -> determinant -> ...`.
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }

    fn is_true(self) -> bool {
        self.as_f64() != 0.0
    }

    /// Implicit C conversion to `kind`.
    fn convert(self, kind: ScalarKind) -> Value {
        match (kind, self) {
            (ScalarKind::Int, Value::Int(v)) => Value::Int(v),
            (ScalarKind::Int, Value::Float(v)) => {
                assert!(v.is_finite(), "conversion of {v} to int");
                Value::Int(v.trunc() as i64)
            }
            (ScalarKind::Float, v) => Value::Float(v.as_f64() as f32 as f64),
            (ScalarKind::Double, v) => Value::Float(v.as_f64()),
        }
    }
}

/// Argument passed to [`Interpreter::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Array argument, elements in row-major order. Updated in place after the call.
    Array(Vec<f64>),
    Float(f64),
    Int(i64),
    /// The same array as the argument at the given (earlier) position.
    Same(usize),
}

impl Arg {
    pub fn array(&self) -> Vec<f64> {
        match self {
            Arg::Array(data) => data.clone(),
            _ => panic!("{self:?} is not an array argument"),
        }
    }
}

#[derive(Debug, Clone)]
struct Buffer {
    data: Rc<RefCell<Vec<Option<f64>>>>,
    element: ScalarKind,
}

/// A (possibly partially indexed) view into an array.
#[derive(Debug, Clone)]
struct View {
    buf: Buffer,
    offset: usize,
    dims: Vec<usize>,
}

impl View {
    fn new(ty: &ArrayType, data: Vec<Option<f64>>) -> Self {
        assert_eq!(data.len(), ty.len(), "initializer size of `{}`", ty.name());
        let element = ty.element();
        let data = data
            .into_iter()
            .map(|v| v.map(|v| Value::Float(v).convert(element).as_f64()))
            .collect();
        Self {
            buf: Buffer {
                data: Rc::new(RefCell::new(data)),
                element,
            },
            offset: 0,
            dims: ty.dims().to_vec(),
        }
    }

    fn index(&self, i: i64) -> Self {
        let (&n, rest) = self
            .dims
            .split_first()
            .expect("subscripted value is not an array");
        assert!(
            i >= 0 && (i as usize) < n,
            "index {i} out of bounds for dimension {n}"
        );
        let stride = rest.iter().product::<usize>();
        Self {
            buf: self.buf.clone(),
            offset: self.offset + i as usize * stride,
            dims: rest.to_vec(),
        }
    }

    fn read(&self) -> Value {
        assert!(self.dims.is_empty(), "array used as a value");
        let v = self.buf.data.borrow()[self.offset].expect("read of uninitialized element");
        match self.buf.element {
            ScalarKind::Int => Value::Int(v as i64),
            _ => Value::Float(v),
        }
    }

    fn write(&self, value: Value) {
        assert!(self.dims.is_empty(), "assignment to an array");
        let v = value.convert(self.buf.element).as_f64();
        self.buf.data.borrow_mut()[self.offset] = Some(v);
    }

    fn values(&self) -> Vec<f64> {
        self.buf
            .data
            .borrow()
            .iter()
            .map(|v| v.expect("uninitialized element in argument"))
            .collect()
    }
}

#[derive(Debug)]
enum Slot {
    Scalar(ScalarKind, Option<Value>),
    Array(View),
}

struct Frame {
    scopes: Vec<HashMap<String, Slot>>,
}

impl Frame {
    fn declare(&mut self, name: &str, slot: Slot) {
        let scope = self.scopes.last_mut().expect("no scope");
        let prev = scope.insert(name.to_string(), slot);
        assert!(prev.is_none(), "`{name}` declared twice in the same scope");
    }

    fn get(&self, name: &str) -> &Slot {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.get(name))
            .unwrap_or_else(|| panic!("undeclared variable `{name}`"))
    }

    fn get_mut(&mut self, name: &str) -> &mut Slot {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|s| s.get_mut(name))
            .unwrap_or_else(|| panic!("undeclared variable `{name}`"))
    }
}

enum Flow {
    Normal,
    Continue,
    Return(Option<Value>),
}

pub struct Interpreter<'a> {
    functions: HashMap<&'a str, &'a Function>,
}

impl<'a> Interpreter<'a> {
    pub fn new(lib: &'a Library) -> Self {
        Self::from_functions(lib.functions())
    }

    pub fn from_functions<I: IntoIterator<Item = &'a Function>>(functions: I) -> Self {
        Self {
            functions: functions
                .into_iter()
                .map(|f| (f.name.as_str(), f))
                .collect(),
        }
    }

    fn function(&self, name: &str) -> &'a Function {
        self.functions
            .get(name)
            .copied()
            .unwrap_or_else(|| panic!("call to undefined function `{name}`"))
    }

    /// Calls the function `name` with `args`, writing array arguments back afterwards.
    pub fn call(&self, name: &str, args: &mut [Arg]) -> Option<Value> {
        let f = self.function(name);
        assert_eq!(f.params.len(), args.len(), "argument count of `{name}`");

        let mut views: Vec<Option<View>> = Vec::new();
        let mut slots = Vec::new();
        for (param, arg) in f.params.iter().zip(args.iter()) {
            let (slot, view) = match (&param.ty, arg) {
                (Type::Array(ty), Arg::Array(data)) => {
                    let view = View::new(ty, data.iter().copied().map(Some).collect());
                    (Slot::Array(view.clone()), Some(view))
                }
                (Type::Array(ty), Arg::Same(k)) => {
                    let view = views[*k].clone().expect("aliased argument is not an array");
                    assert_eq!(view.dims, ty.dims(), "aliased argument has a different type");
                    (Slot::Array(view), None)
                }
                (Type::Scalar(kind), Arg::Float(v)) => {
                    (Slot::Scalar(*kind, Some(Value::Float(*v).convert(*kind))), None)
                }
                (Type::Scalar(kind), Arg::Int(v)) => {
                    (Slot::Scalar(*kind, Some(Value::Int(*v).convert(*kind))), None)
                }
                (ty, arg) => panic!("{arg:?} passed for parameter of type {ty:?}"),
            };
            slots.push(slot);
            views.push(view);
        }

        let ret = self.invoke(f, slots, 0);
        for (arg, view) in args.iter_mut().zip(views) {
            if let (Arg::Array(data), Some(view)) = (arg, view) {
                *data = view.values();
            }
        }
        ret
    }

    fn invoke(&self, f: &Function, args: Vec<Slot>, depth: usize) -> Option<Value> {
        assert!(depth < MAX_DEPTH, "recursion limit reached in `{}`", f.name);
        let mut frame = Frame {
            scopes: vec![HashMap::new()],
        };
        for (param, slot) in f.params.iter().zip(args) {
            frame.declare(&param.name, slot);
        }

        let ret = match self.stmts(&mut frame, &f.body, depth) {
            Flow::Normal => None,
            Flow::Return(v) => v,
            Flow::Continue => panic!("`continue` outside of a loop in `{}`", f.name),
        };
        match (f.ret, ret) {
            (Some(kind), Some(v)) => Some(v.convert(kind)),
            (None, None) => None,
            (Some(_), None) => panic!("`{}` returned without a value", f.name),
            (None, Some(_)) => panic!("void function `{}` returned a value", f.name),
        }
    }

    fn block(&self, frame: &mut Frame, stmts: &[Stmt], depth: usize) -> Flow {
        frame.scopes.push(HashMap::new());
        let flow = self.stmts(frame, stmts, depth);
        frame.scopes.pop();
        flow
    }

    fn stmts(&self, frame: &mut Frame, stmts: &[Stmt], depth: usize) -> Flow {
        for s in stmts {
            match self.stmt(frame, s, depth) {
                Flow::Normal => {}
                flow => return flow,
            }
        }
        Flow::Normal
    }

    fn stmt(&self, frame: &mut Frame, s: &Stmt, depth: usize) -> Flow {
        match s {
            Stmt::Declare { ty, names } => {
                for name in names {
                    let slot = match ty {
                        Type::Scalar(kind) => Slot::Scalar(*kind, None),
                        Type::Array(ty) => Slot::Array(View::new(ty, vec![None; ty.len()])),
                    };
                    frame.declare(name, slot);
                }
            }
            Stmt::Let { ty, name, init } => {
                let slot = match (ty, init) {
                    (Type::Scalar(kind), Init::Expr(e)) => {
                        Slot::Scalar(*kind, Some(self.eval(frame, e, depth).convert(*kind)))
                    }
                    (Type::Array(ty), Init::Rows(rows)) => {
                        assert_eq!(rows.len(), ty.dims()[0], "row count of `{name}`");
                        let mut data = Vec::new();
                        for row in rows {
                            assert_eq!(row.len(), ty.len() / ty.dims()[0], "row of `{name}`");
                            for e in row {
                                data.push(Some(self.eval(frame, e, depth).as_f64()));
                            }
                        }
                        Slot::Array(View::new(ty, data))
                    }
                    _ => panic!("invalid initializer for `{name}`"),
                };
                frame.declare(name, slot);
            }
            Stmt::Assign { place, value } => {
                let v = self.eval(frame, value, depth);
                self.store(frame, place, v);
            }
            Stmt::AddAssign { place, value } => {
                let v = self.eval(frame, value, depth);
                let cur = self.eval(frame, place, depth);
                self.store(frame, place, binary(BinOp::Add, cur, v));
            }
            Stmt::Increment(name) => match frame.get_mut(name) {
                Slot::Scalar(ScalarKind::Int, Some(Value::Int(v))) => *v += 1,
                slot => panic!("`{name}++` on {slot:?}"),
            },
            Stmt::Copy {
                dst,
                src,
                element,
                count,
            } => {
                let (dst, src) = (self.view(frame, dst, depth), self.view(frame, src, depth));
                assert_eq!(dst.buf.element, *element, "memcpy element size");
                assert_eq!(src.buf.element, *element, "memcpy element size");
                let tmp = {
                    let data = src.buf.data.borrow();
                    assert!(src.offset + count <= data.len(), "memcpy source out of bounds");
                    data[src.offset..src.offset + count].to_vec()
                };
                let mut data = dst.buf.data.borrow_mut();
                assert!(dst.offset + count <= data.len(), "memcpy destination out of bounds");
                data[dst.offset..dst.offset + count].copy_from_slice(&tmp);
            }
            Stmt::For { var, end, body } => {
                for i in 0..*end {
                    frame.scopes.push(HashMap::new());
                    frame.declare(var, Slot::Scalar(ScalarKind::Int, Some(Value::Int(i as i64))));
                    let flow = self.block(frame, body, depth);
                    frame.scopes.pop();
                    match flow {
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return ret,
                    }
                }
            }
            Stmt::If { cond, then } => {
                if self.eval(frame, cond, depth).is_true() {
                    return self.block(frame, then, depth);
                }
            }
            Stmt::Continue => return Flow::Continue,
            Stmt::Return(e) => return Flow::Return(e.as_ref().map(|e| self.eval(frame, e, depth))),
            Stmt::Expr(Expr::Call(name, args)) => {
                self.call_expr(frame, name, args, depth);
            }
            Stmt::Expr(e) => {
                self.eval(frame, e, depth);
            }
        }
        Flow::Normal
    }

    fn store(&self, frame: &mut Frame, place: &Expr, value: Value) {
        match place {
            Expr::Var(name) => match frame.get_mut(name) {
                Slot::Scalar(kind, v) => *v = Some(value.convert(*kind)),
                Slot::Array(_) => panic!("assignment to array `{name}`"),
            },
            Expr::Index(..) => self.view(frame, place, 0).write(value),
            _ => panic!("not assignable: {place:?}"),
        }
    }

    fn view(&self, frame: &Frame, e: &Expr, depth: usize) -> View {
        match e {
            Expr::Var(name) => match frame.get(name) {
                Slot::Array(view) => view.clone(),
                Slot::Scalar(..) => panic!("`{name}` is not an array"),
            },
            Expr::Index(base, index) => match self.eval(frame, index, depth) {
                Value::Int(i) => self.view(frame, base, depth).index(i),
                Value::Float(_) => panic!("non-integer array index in {e:?}"),
            },
            _ => panic!("not an array: {e:?}"),
        }
    }

    fn eval(&self, frame: &Frame, e: &Expr, depth: usize) -> Value {
        match e {
            Expr::Var(name) => match frame.get(name) {
                Slot::Scalar(_, Some(v)) => *v,
                Slot::Scalar(_, None) => panic!("read of uninitialized `{name}`"),
                Slot::Array(_) => panic!("array `{name}` used as a value"),
            },
            Expr::Int(v) => Value::Int(*v),
            Expr::Lit(kind, v) => Value::Float(*v).convert(*kind),
            Expr::Index(..) => self.view(frame, e, depth).read(),
            Expr::Binary(op, lhs, rhs) => binary(
                *op,
                self.eval(frame, lhs, depth),
                self.eval(frame, rhs, depth),
            ),
            Expr::Cond(cond, then, otherwise) => {
                if self.eval(frame, cond, depth).is_true() {
                    self.eval(frame, then, depth)
                } else {
                    self.eval(frame, otherwise, depth)
                }
            }
            Expr::Cast(kind, e) => self.eval(frame, e, depth).convert(*kind),
            Expr::Sqrt(kind, e) => {
                let kind = kind.magnitude_kind();
                let v = self.eval(frame, e, depth).convert(kind).as_f64();
                Value::Float(v.sqrt()).convert(kind)
            }
            Expr::Call(name, args) => self
                .call_expr(frame, name, args, depth)
                .unwrap_or_else(|| panic!("void function `{name}` used as a value")),
        }
    }

    fn call_expr(&self, frame: &Frame, name: &str, args: &[Expr], depth: usize) -> Option<Value> {
        let f = self.function(name);
        assert_eq!(f.params.len(), args.len(), "argument count of `{name}`");
        let slots = f
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| match &param.ty {
                Type::Array(ty) => {
                    let view = self.view(frame, arg, depth);
                    assert_eq!(view.dims, ty.dims(), "argument `{}` of `{name}`", param.name);
                    assert_eq!(view.buf.element, ty.element());
                    Slot::Array(view)
                }
                Type::Scalar(kind) => {
                    Slot::Scalar(*kind, Some(self.eval(frame, arg, depth).convert(*kind)))
                }
            })
            .collect();
        self.invoke(f, slots, depth + 1)
    }
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Value::Int(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => {
                assert_ne!(b, 0, "integer division by zero");
                a / b
            }
            BinOp::Rem => {
                assert_ne!(b, 0, "integer division by zero");
                a % b
            }
            BinOp::Eq => (a == b) as i64,
            BinOp::Lt => (a < b) as i64,
        }),
        (lhs, rhs) => {
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            match op {
                BinOp::Add => Value::Float(a + b),
                BinOp::Sub => Value::Float(a - b),
                BinOp::Mul => Value::Float(a * b),
                BinOp::Div => Value::Float(a / b),
                BinOp::Rem => panic!("`%` with a floating-point operand"),
                BinOp::Eq => Value::Int((a == b) as i64),
                BinOp::Lt => Value::Int((a < b) as i64),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{lit_int, var};

    fn vec2i() -> ArrayType {
        ArrayType::new("V", ScalarKind::Int, vec![2])
    }

    fn run(f: Function, args: &mut [Arg]) -> Option<Value> {
        let name = f.name.clone();
        let functions = [f];
        Interpreter::from_functions(&functions).call(&name, args)
    }

    #[test]
    fn c_integer_semantics() {
        let f = Function::new("f")
            .returns(ScalarKind::Int)
            .param(ScalarKind::Int, "a")
            .stmt(Stmt::ret(var("a") / 2 + var("a") % 2));
        assert_eq!(run(f.clone(), &mut [Arg::Int(-7)]), Some(Value::Int(-4)));
        // Passing a float to an `int` parameter truncates.
        assert_eq!(run(f, &mut [Arg::Float(7.9)]), Some(Value::Int(4)));
    }

    #[test]
    fn float_storage_rounds() {
        let f = Function::new("f")
            .returns(ScalarKind::Float)
            .stmt(Stmt::ret(crate::code::lit(ScalarKind::Double, 0.1)));
        assert_eq!(run(f, &mut []).unwrap().as_f64(), 0.1f32 as f64);
    }

    #[test]
    fn integer_sqrt_is_single_precision() {
        let f = Function::new("f")
            .returns(ScalarKind::Float)
            .param(ScalarKind::Int, "n")
            .stmt(Stmt::ret(var("n").sqrt(ScalarKind::Int)));
        assert_eq!(run(f, &mut [Arg::Int(2)]), Some(Value::Float(2f32.sqrt() as f64)));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn bounds_checked() {
        let f = Function::new("f")
            .param(&vec2i(), "out")
            .stmt(Stmt::assign(var("out").at(2), lit_int(1)));
        run(f, &mut [Arg::Array(vec![0.0; 2])]);
    }

    #[test]
    #[should_panic(expected = "uninitialized")]
    fn uninitialized_read() {
        let f = Function::new("f")
            .param(&vec2i(), "out")
            .stmt(Stmt::declare(&vec2i(), ["tmp"]))
            .stmt(Stmt::copy(var("out"), var("tmp"), ScalarKind::Int, 2));
        run(f, &mut [Arg::Array(vec![0.0; 2])]);
    }

    #[test]
    fn loop_scopes() {
        // `acc` is redeclared in every iteration; a leaked declaration would panic.
        let f = Function::new("f")
            .returns(ScalarKind::Int)
            .stmts([
                Stmt::let_(ScalarKind::Int, "n", lit_int(0)),
                Stmt::for_(
                    "i",
                    3,
                    vec![
                        Stmt::let_(ScalarKind::Int, "acc", var("i")),
                        Stmt::if_(var("i").equals(1), vec![Stmt::Continue]),
                        Stmt::add_assign(var("n"), var("acc")),
                    ],
                ),
                Stmt::ret(var("n")),
            ]);
        assert_eq!(run(f, &mut []), Some(Value::Int(2)));
    }
}
