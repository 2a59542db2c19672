use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Token bucket gating requests to one scope (a domain or the global scope)
///
/// The bucket holds `capacity` tokens. A token taken at time `t` comes back at
/// `t + interval`, so no more than `capacity` acquisitions ever complete inside
/// one interval. Waiters queue on a fair mutex and are served in arrival order;
/// requests are delayed, never dropped.
#[derive(Debug)]
pub struct RateLimiter {
    /// Tokens in the bucket when full
    capacity: u32,

    /// Time a taken token needs to return
    interval: Duration,

    /// When each token currently out of the bucket was taken, oldest first
    taken: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a full bucket
    ///
    /// A zero capacity is treated as one so the limiter can never deadlock.
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            interval,
            taken: Mutex::new(VecDeque::with_capacity(capacity as usize)),
        }
    }

    /// Creates a limiter allowing `requests` per second
    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a token is available and takes it
    ///
    /// Dropping the returned future before it completes takes no token.
    pub async fn acquire(&self) {
        let mut taken = self.taken.lock().await;

        loop {
            let now = Instant::now();
            self.return_expired(&mut taken, now);

            if taken.len() < self.capacity as usize {
                taken.push_back(now);
                return;
            }

            let wait = self.time_until_next_token(&taken, now);
            tracing::trace!(wait_ms = wait.as_millis() as u64, "Rate limiter full, waiting");
            sleep(wait).await;
        }
    }

    /// Number of tokens that could be taken right now without waiting
    pub async fn available(&self) -> u32 {
        let mut taken = self.taken.lock().await;
        self.return_expired(&mut taken, Instant::now());
        self.capacity - taken.len() as u32
    }

    /// Puts back every token whose interval has elapsed
    fn return_expired(&self, taken: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = taken.front() {
            if now.duration_since(*oldest) >= self.interval {
                taken.pop_front();
            } else {
                break;
            }
        }
    }

    /// Calculates the time until the oldest taken token returns
    fn time_until_next_token(&self, taken: &VecDeque<Instant>, now: Instant) -> Duration {
        taken
            .front()
            .map(|oldest| self.interval.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(Duration::ZERO)
    }
}
