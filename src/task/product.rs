// src/task/product.rs

//! Products (typed task outputs) and Requirements (typed task inputs).
//!
//! A [`Product`] owns a shared [`ProductRef`] cell holding its payload, plus
//! the list of [`Requirement`]s that must exist before it can be computed.
//! Binding a requirement stores a clone of the fulfilling product's handle,
//! so results outlive the task that produced them.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Type tag of scalar (`f64`) products. Requirements of this type can only be
/// bound explicitly.
pub const SCALAR_TYPE: &str = "double";

/// Type tag of boolean products.
pub const BOOL_TYPE: &str = "bool";

/// Type-erased payload stored in a product once its task has run.
pub type Payload = Rc<dyn Any>;

/// Shared state of a product: identity, payload slot and `used` flag.
pub struct ProductCell {
    ty: String,
    name: String,
    payload: RefCell<Option<Payload>>,
    used: Cell<bool>,
}

impl fmt::Debug for ProductCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductCell")
            .field("ty", &self.ty)
            .field("name", &self.name)
            .field("exists", &self.exists())
            .field("used", &self.used.get())
            .finish()
    }
}

impl ProductCell {
    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A product exists once its payload has been set.
    pub fn exists(&self) -> bool {
        self.payload.borrow().is_some()
    }

    pub fn is_used(&self) -> bool {
        self.used.get()
    }

    pub fn payload(&self) -> Option<Payload> {
        self.payload.borrow().clone()
    }

    /// Typed view of the payload, if set and of type `T`.
    pub fn value<T: 'static>(&self) -> Option<Rc<T>> {
        self.payload().and_then(|p| p.downcast::<T>().ok())
    }

    /// Set the payload. Returns `false` (and leaves the payload untouched) if
    /// it was already set.
    pub(crate) fn set(&self, payload: Payload) -> bool {
        let mut slot = self.payload.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(payload);
        true
    }
}

/// Cheap, clonable handle on a product's shared state.
pub type ProductRef = Rc<ProductCell>;

/// A named, typed output of a task.
#[derive(Debug)]
pub struct Product {
    cell: ProductRef,
    requirements: Vec<Requirement>,
}

impl Product {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cell: Rc::new(ProductCell {
                ty: ty.into(),
                name: name.into(),
                payload: RefCell::new(None),
                used: Cell::new(false),
            }),
            requirements: Vec::new(),
        }
    }

    /// A product that already exists, holding `value`.
    ///
    /// Used for literal bindings (`using.<req>."=" = 1.5`).
    pub fn literal<T: 'static>(ty: impl Into<String>, name: impl Into<String>, value: T) -> Self {
        let product = Self::new(ty, name);
        product.cell.set(Rc::new(value));
        product
    }

    /// Builder-style: declare a requirement on this product.
    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn add_requirement(&mut self, requirement: Requirement) {
        self.requirements.push(requirement);
    }

    pub fn ty(&self) -> &str {
        self.cell.ty()
    }

    pub fn name(&self) -> &str {
        self.cell.name()
    }

    pub fn exists(&self) -> bool {
        self.cell.exists()
    }

    pub fn is_used(&self) -> bool {
        self.cell.is_used()
    }

    pub fn handle(&self) -> ProductRef {
        Rc::clone(&self.cell)
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn requirements_mut(&mut self) -> &mut [Requirement] {
        &mut self.requirements
    }

    /// Whether every requirement of this product currently exists.
    pub fn is_ready(&self) -> bool {
        self.requirements.iter().all(Requirement::exists)
    }
}

/// A named, typed input need of a product.
#[derive(Debug, Clone)]
pub struct Requirement {
    ty: String,
    name: String,
    binding: Option<ProductRef>,
}

impl Requirement {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            binding: None,
        }
    }

    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fulfilled(&self) -> bool {
        self.binding.is_some()
    }

    /// Bound and the bound product's payload has been set.
    pub fn exists(&self) -> bool {
        self.binding.as_ref().is_some_and(|p| p.exists())
    }

    pub fn product(&self) -> Option<&ProductRef> {
        self.binding.as_ref()
    }

    /// Bind this requirement to `product` and mark the product as used.
    ///
    /// Returns `false` if the requirement was already bound; the existing
    /// binding is never replaced.
    pub fn bind(&mut self, product: ProductRef) -> bool {
        if self.binding.is_some() {
            return false;
        }
        product.used.set(true);
        self.binding = Some(product);
        true
    }
}
