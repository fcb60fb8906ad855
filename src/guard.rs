//! Scoped ownership of gfx-hal objects while a multi-step setup is running.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use gfx_hal as hal;

/// Holds an object created from `owner` and passes it to `destroy` when
/// dropped, unless it was taken out with [`Guard::release`].
pub(crate) struct Guard<O, T> {
    owner: Rc<O>,
    value: ManuallyDrop<T>,
    destroy: fn(&O, T),
    released: bool,
}

/// A guard over an object owned by the logical device of `B`.
pub(crate) type DeviceGuard<B, T> = Guard<<B as hal::Backend>::Device, T>;

impl<O, T> Guard<O, T> {
    pub(crate) fn new(owner: &Rc<O>, value: T, destroy: fn(&O, T)) -> Self {
        Guard {
            owner: owner.clone(),
            value: ManuallyDrop::new(value),
            destroy,
            released: false,
        }
    }

    /// Gives up ownership; the caller is now responsible for destroying it.
    pub(crate) fn release(mut self) -> T {
        self.released = true;
        unsafe { ManuallyDrop::take(&mut self.value) }
    }
}

impl<O, T> Deref for Guard<O, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<O, T> DerefMut for Guard<O, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<O, T> Drop for Guard<O, T> {
    fn drop(&mut self) {
        if !self.released {
            let value = unsafe { ManuallyDrop::take(&mut self.value) };
            (self.destroy)(&self.owner, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Destroyed = RefCell<Vec<u32>>;

    fn record(destroyed: &Destroyed, id: u32) {
        destroyed.borrow_mut().push(id);
    }

    #[test]
    fn dropped_guards_destroy_in_reverse_order() {
        let destroyed = Rc::new(Destroyed::default());
        {
            let _first = Guard::new(&destroyed, 1, record);
            let _second = Guard::new(&destroyed, 2, record);
        }
        assert_eq!(*destroyed.borrow(), vec![2, 1]);
    }

    #[test]
    fn released_value_is_not_destroyed() {
        let destroyed = Rc::new(Destroyed::default());
        let guard = Guard::new(&destroyed, 7, record);
        assert_eq!(guard.release(), 7);
        assert!(destroyed.borrow().is_empty());
        assert_eq!(Rc::strong_count(&destroyed), 1);
    }

    #[test]
    fn guarded_value_is_usable_in_place() {
        let destroyed = Rc::new(Destroyed::default());
        let mut guard = Guard::new(&destroyed, 1, record);
        *guard += 4;
        assert_eq!(*guard, 5);
        drop(guard);
        assert_eq!(*destroyed.borrow(), vec![5]);
    }
}
