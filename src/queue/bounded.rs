//! # Cola Acotada Multi-Productor / Multi-Consumidor
//! src/queue/bounded.rs
//!
//! Buffer circular de capacidad fija protegido por un `Mutex` y dos
//! `Condvar`: una para "ya no está llena" y otra para "ya no está vacía".
//!
//! - `push` bloquea mientras la cola está llena
//! - `pop` bloquea mientras la cola está vacía
//!
//! No hay cancelación: un `push` bloqueado solo lo libera un `pop` y
//! viceversa. Para apagar a los consumidores se encolan valores centinela.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Estado interno del buffer circular
struct Ring<T> {
    /// Slots del buffer (capacidad fija)
    slots: Vec<Option<T>>,

    /// Índice del elemento más antiguo
    head: usize,

    /// Número de slots ocupados
    len: usize,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, head: 0, len: 0 }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    fn push_back(&mut self, item: T) {
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = Some(item);
        self.len += 1;
    }

    fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }
}

/// Cola FIFO acotada y thread-safe
///
/// Si el `push` de `a` retorna antes de que empiece el `push` de `b`,
/// cualquier par de `pop` que los devuelva entrega `a` antes que `b`.
///
/// # Ejemplo
/// ```
/// use file_server::queue::BoundedQueue;
///
/// let queue = BoundedQueue::new(2);
/// queue.push(1);
/// queue.push(2);
/// assert!(queue.is_full());
/// assert_eq!(queue.pop(), 1);
/// assert_eq!(queue.pop(), 2);
/// ```
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,

    /// Se notifica cuando un `pop` libera un slot
    not_full: Condvar,

    /// Se notifica cuando un `push` ocupa un slot
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola con capacidad fija
    ///
    /// # Panics
    ///
    /// Si `capacity` es 0: una cola sin slots bloquearía para siempre.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedQueue capacity must be >= 1");
        Self {
            ring: Mutex::new(Ring::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    // Un productor o consumidor que hizo panic no deja el ring inconsistente:
    // push_back/pop_front no pueden fallar a la mitad.
    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola al final, bloqueando mientras la cola esté llena
    pub fn push(&self, item: T) {
        let mut ring = self.lock();
        while ring.is_full() {
            ring = self
                .not_full
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        }
        ring.push_back(item);
        drop(ring);

        // Cada push habilita exactamente un pop
        self.not_empty.notify_one();
    }

    /// Desencola el elemento más antiguo, bloqueando mientras esté vacía
    pub fn pop(&self) -> T {
        let mut ring = self.lock();
        loop {
            if let Some(item) = ring.pop_front() {
                drop(ring);
                self.not_full.notify_one();
                return item;
            }
            ring = self
                .not_empty
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_pop(&self) -> Option<T> {
        let item = self.lock().pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Número de elementos encolados en este instante
    pub fn len(&self) -> usize {
        self.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.lock().is_full()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }
}
