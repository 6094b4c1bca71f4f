//! A fixed-capacity object pool that hands out slots through a `SlotBitmap`.

use slot_bitmap::{SlotBitmap, SlotBitmapError};

struct Pool<T> {
    slots: SlotBitmap,
    items: Vec<Option<T>>,
}

impl<T> Pool<T> {
    fn with_capacity(capacity: usize) -> Result<Self, SlotBitmapError> {
        Ok(Self {
            slots: SlotBitmap::new(capacity)?,
            items: (0..capacity).map(|_| None).collect(),
        })
    }

    fn insert(&mut self, value: T) -> Option<usize> {
        let i = self.slots.first_open()?;
        self.slots.set(i);
        self.items[i] = Some(value);
        Some(i)
    }

    fn remove(&mut self, i: usize) -> Option<T> {
        if !self.slots.reset(i) {
            return None;
        }
        self.items[i].take()
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .filter_map(|i| self.items[i].as_ref().map(|item| (i, item)))
    }
}

fn main() -> Result<(), SlotBitmapError> {
    let mut pool = Pool::with_capacity(130)?;

    let keys: Vec<usize> = (0..130)
        .filter_map(|n| pool.insert(format!("item-{n}")))
        .collect();
    println!(
        "inserted {} items, pool full: {}",
        keys.len(),
        pool.slots.is_full()
    );
    assert_eq!(pool.insert("overflow".to_string()), None);

    // Free a scattered handful, then reuse the lowest hole first.
    for i in [3, 64, 65, 129] {
        pool.remove(i);
    }
    println!("open slot after removals: {:?}", pool.slots.first_open());
    let reused = pool.insert("reused".to_string());
    println!("reused slot: {reused:?}");

    println!("first three live items:");
    for (i, item) in pool.iter().take(3) {
        println!("  {i}: {item}");
    }
    println!("last live item: {:?}", pool.iter().next_back());

    pool.slots.clear();
    println!(
        "after clear: {} active, first open {:?}",
        pool.slots.len(),
        pool.slots.first_open()
    );

    match SlotBitmap::new(10_000) {
        Ok(_) => unreachable!(),
        Err(err) => println!("oversized pool rejected: {err}"),
    }
    Ok(())
}
