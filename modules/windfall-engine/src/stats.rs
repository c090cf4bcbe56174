//! Per-run counters, printed once at the end of each account's run.

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub discovered: u32,
    pub duplicates_in_batch: u32,
    pub already_entered: u32,
    pub filtered_out: u32,
    pub reservations: u32,
    pub entered: u32,
    pub soft_failures: u32,
    pub hard_stop: bool,
    pub flagged: bool,
    pub follow_capped: bool,
    pub filler_posts: u32,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Campaign Run Complete ===")?;
        writeln!(f, "Candidates discovered:  {}", self.discovered)?;
        writeln!(f, "Batch duplicates:       {}", self.duplicates_in_batch)?;
        writeln!(f, "Already entered:        {}", self.already_entered)?;
        writeln!(f, "Filtered out:           {}", self.filtered_out)?;
        writeln!(f, "Reservations made:      {}", self.reservations)?;
        writeln!(f, "Entries completed:      {}", self.entered)?;
        writeln!(f, "Soft failures:          {}", self.soft_failures)?;
        writeln!(f, "Filler posts:           {}", self.filler_posts)?;
        if self.flagged {
            writeln!(f, "Account flagged during this run")?;
        }
        if self.follow_capped {
            writeln!(f, "Follow cap reached during this run")?;
        }
        if self.hard_stop {
            writeln!(f, "Run ended on a hard stop")?;
        }
        Ok(())
    }
}
