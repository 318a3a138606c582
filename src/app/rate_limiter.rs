use crate::utils::time_utils::current_timestamp;

/**
 * Counts the calls made to the sensitive endpoints (login,
 * register, newsletter) per window of time and blocks them
 * all for a while when there are too many. Global to the
 * server, not per client.
 */
pub struct BasicRateLimiter {
  counter: u32,
  window_start: i64,
  is_limited: bool,
  max_requests: u32,
  max_requests_time: u32,
  block_duration: u32
}

impl BasicRateLimiter {

  pub fn new(
    max_requests: u32,
    max_requests_time: u32,
    block_duration: u32
  ) -> Self {
    Self {
      counter: 0,
      window_start: current_timestamp(),
      is_limited: false,
      max_requests,
      max_requests_time,
      block_duration
    }
  }

  pub fn is_locked(&self) -> bool {
    self.is_limited
  }

  // The window is the block duration while locked, the
  // counting window otherwise.
  pub fn is_expired_at(&self, now: i64) -> bool {
    let window = if self.is_limited {
      self.block_duration
    } else {
      self.max_requests_time
    };
    now - self.window_start >= i64::from(window)
  }

  // Registers one request, returns true if it has to be
  // refused.
  pub fn hit_at(&mut self, now: i64) -> bool {
    if self.is_expired_at(now) {
      self.counter = 0;
      self.window_start = now;
      self.is_limited = false;
    }
    if self.is_limited {
      return true;
    }
    self.counter += 1;
    if self.counter > self.max_requests {
      self.is_limited = true;
      // The block starts now.
      self.window_start = now;
    }
    self.is_limited
  }

  pub fn hit(&mut self) -> bool {
    self.hit_at(current_timestamp())
  }

}
