/// Inclusive wager limits and the increments the wager control moves by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WagerBounds {
    pub min: u64,
    pub max: u64,
    pub step: u64,
    pub big_step: u64,
}

impl WagerBounds {
    pub const CLASSIC: WagerBounds = WagerBounds {
        min: 10,
        max: 2000,
        step: 10,
        big_step: 100,
    };

    pub const GRAND: WagerBounds = WagerBounds {
        min: 50,
        max: 5000,
        step: 50,
        big_step: 500,
    };

    pub fn clamp(&self, value: i64) -> u64 {
        value.clamp(self.min as i64, self.max as i64) as u64
    }

    pub fn contains(&self, wager: u64) -> bool {
        (self.min..=self.max).contains(&wager)
    }
}

/// The bounded wager selector behind the `+`/`-` keys.
#[derive(Clone, Debug)]
pub struct WagerControl {
    bounds: WagerBounds,
    value: u64,
}

impl WagerControl {
    pub fn new(bounds: WagerBounds) -> Self {
        Self {
            bounds,
            value: bounds.min,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn bounds(&self) -> WagerBounds {
        self.bounds
    }

    pub fn adjust(&mut self, delta: i64) -> u64 {
        let next = (self.value as i64).saturating_add(delta);
        self.value = self.bounds.clamp(next);
        self.value
    }

    pub fn increase(&mut self) -> u64 {
        self.adjust(self.bounds.step as i64)
    }

    pub fn decrease(&mut self) -> u64 {
        self.adjust(-(self.bounds.step as i64))
    }

    pub fn increase_big(&mut self) -> u64 {
        self.adjust(self.bounds.big_step as i64)
    }

    pub fn decrease_big(&mut self) -> u64 {
        self.adjust(-(self.bounds.big_step as i64))
    }
}
