//! Generation-checked slot arena backing the opaque handles.
//!
//! # Design
//! A token packs `slot index + 1` into the low half of a `usize` and the slot
//! generation into the high half, so `0` is never a valid token and tokens
//! stay address-sized on 32-bit hosts. Removing a value bumps its slot's
//! generation: a stale token (used after destroy, or destroyed twice) no
//! longer matches and is rejected instead of reaching a reused slot.

const INDEX_BITS: u32 = usize::BITS / 2;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: usize = INDEX_MASK;

#[derive(Debug)]
struct Slot<T> {
    generation: usize,
    value: Option<T>,
}

#[derive(Debug)]
pub struct HandleRegistry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> HandleRegistry<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn token(index: usize, generation: usize) -> usize {
        (generation << INDEX_BITS) | (index + 1)
    }

    fn decode(token: usize) -> Option<(usize, usize)> {
        let low = token & INDEX_MASK;
        if low == 0 {
            return None;
        }
        Some((low - 1, token >> INDEX_BITS))
    }

    /// Store `value` and return its token, or `None` if the index space is
    /// exhausted.
    pub fn insert(&mut self, value: T) -> Option<usize> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return Some(Self::token(index, slot.generation));
        }
        let index = self.slots.len();
        if index >= INDEX_MASK {
            return None;
        }
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Some(Self::token(index, 0))
    }

    pub fn get(&self, token: usize) -> Option<&T> {
        let (index, generation) = Self::decode(token)?;
        let slot = self.slots.get(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn remove(&mut self, token: usize) -> Option<T> {
        let (index, generation) = Self::decode(token)?;
        let slot = self.slots.get_mut(index)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = (slot.generation + 1) & GENERATION_MASK;
        self.free.push(index);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_never_zero() {
        let mut reg = HandleRegistry::new();
        let token = reg.insert("a").unwrap();
        assert_ne!(token, 0);
        assert!(reg.get(0).is_none());
    }

    #[test]
    fn insert_get_remove() {
        let mut reg = HandleRegistry::new();
        let a = reg.insert(1).unwrap();
        let b = reg.insert(2).unwrap();
        assert_eq!(reg.get(a), Some(&1));
        assert_eq!(reg.get(b), Some(&2));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.remove(a), Some(1));
        assert!(reg.get(a).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn double_remove_is_rejected() {
        let mut reg = HandleRegistry::new();
        let a = reg.insert(1).unwrap();
        assert_eq!(reg.remove(a), Some(1));
        assert_eq!(reg.remove(a), None);
    }

    #[test]
    fn reused_slot_rejects_stale_token() {
        let mut reg = HandleRegistry::new();
        let old = reg.insert("old").unwrap();
        reg.remove(old);
        let new = reg.insert("new").unwrap();
        assert_ne!(old, new);
        assert!(reg.get(old).is_none());
        assert!(reg.remove(old).is_none());
        assert_eq!(reg.get(new), Some(&"new"));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let mut reg: HandleRegistry<u8> = HandleRegistry::new();
        assert!(reg.get(usize::MAX).is_none());
        assert!(reg.remove(12345).is_none());
        assert!(reg.is_empty());
    }
}
