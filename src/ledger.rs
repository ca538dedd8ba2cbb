/// ENFORCED LEDGER TYPE - Used by every store adapter
///
/// This is the SINGLE source of truth for balance operations.
/// ALL balance mutations MUST go through these methods.
///
/// # Enforcement Strategy:
/// 1. Fields are PRIVATE - no direct access
/// 2. All mutations return Result - errors are explicit
/// 3. Version auto-increments - optimistic concurrency + audit trail
/// 4. Checked Decimal arithmetic - no silent sign flips
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance pair for a single account
///
/// # Invariants (ENFORCED by private fields):
/// - `available >= 0` and `pending_withdrawals >= 0` at all times
/// - A reservation never drives `available` negative
/// - Version increments on every mutation
/// - All state changes return Result
///
/// # Usage:
/// ```
/// use payout_core::ledger::AccountLedger;
/// use rust_decimal::Decimal;
///
/// let mut ledger = AccountLedger::default();
/// ledger.credit(Decimal::from(500)).unwrap();   // available = 500
/// ledger.reserve(Decimal::from(200)).unwrap();  // available = 300, pending = 200
/// ledger.release(Decimal::from(200)).unwrap();  // available = 500, pending = 0
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccountLedger {
    available: Decimal,           // PRIVATE - ONLY modified through credit/reserve/release/settle
    pending_withdrawals: Decimal, // PRIVATE - ONLY modified through reserve/release/settle
    version: u64,                 // PRIVATE - incremented on every mutation
}

impl AccountLedger {
    /// Rebuild a ledger from stored fields (store adapters only).
    ///
    /// # Errors
    /// Rejects negative components: a negative stored balance means the
    /// backing row was corrupted outside this type.
    pub fn from_parts(
        available: Decimal,
        pending_withdrawals: Decimal,
        version: u64,
    ) -> Result<Self, &'static str> {
        if available.is_sign_negative() || pending_withdrawals.is_sign_negative() {
            return Err("Negative stored balance");
        }
        Ok(Self {
            available,
            pending_withdrawals,
            version,
        })
    }

    // ============================================================
    // READ-ONLY GETTERS (safe to expose)
    // ============================================================

    /// Get available balance (read-only)
    #[inline(always)]
    pub const fn available(&self) -> Decimal {
        self.available
    }

    /// Get funds reserved against in-flight withdrawals (read-only)
    #[inline(always)]
    pub const fn pending_withdrawals(&self) -> Decimal {
        self.pending_withdrawals
    }

    /// Get version (read-only) - incremented on every mutation
    #[inline(always)]
    pub const fn version(&self) -> u64 {
        self.version
    }

    // ============================================================
    // VALIDATED MUTATIONS (ENFORCED operations)
    // ============================================================

    /// Credit funds to the available balance (deposits / top-ups).
    ///
    /// # Errors
    /// - "Credit must be positive" for zero or negative amounts
    pub fn credit(&mut self, amount: Decimal) -> Result<(), &'static str> {
        if amount <= Decimal::ZERO {
            return Err("Credit must be positive");
        }
        self.available += amount;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Reserve funds against a withdrawal request
    /// (move from available to pending_withdrawals).
    ///
    /// # Errors
    /// - "Reservation must be positive" for zero or negative amounts
    /// - "Insufficient funds" if available < amount
    pub fn reserve(&mut self, amount: Decimal) -> Result<(), &'static str> {
        if amount <= Decimal::ZERO {
            return Err("Reservation must be positive");
        }
        if self.available < amount {
            return Err("Insufficient funds");
        }
        self.available -= amount;
        self.pending_withdrawals += amount;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Release a reservation back to available (cancel / reject).
    ///
    /// # Errors
    /// - "Release must be positive" for zero or negative amounts
    /// - "Insufficient reserved funds" if pending_withdrawals < amount
    pub fn release(&mut self, amount: Decimal) -> Result<(), &'static str> {
        if amount <= Decimal::ZERO {
            return Err("Release must be positive");
        }
        if self.pending_withdrawals < amount {
            return Err("Insufficient reserved funds");
        }
        self.pending_withdrawals -= amount;
        self.available += amount;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Settle a reservation (remove from pending_withdrawals without
    /// touching available). Used on approval: the reserved funds are
    /// handed to the external payment rail.
    ///
    /// # Errors
    /// - "Settlement must be positive" for zero or negative amounts
    /// - "Insufficient reserved funds" if pending_withdrawals < amount
    pub fn settle(&mut self, amount: Decimal) -> Result<(), &'static str> {
        if amount <= Decimal::ZERO {
            return Err("Settlement must be positive");
        }
        if self.pending_withdrawals < amount {
            return Err("Insufficient reserved funds");
        }
        self.pending_withdrawals -= amount;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }
}

// ============================================================
// TESTS - Prove enforcement works
// ============================================================
