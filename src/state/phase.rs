use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Phases a single game's auction moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuctionPhase {
    /// Game record exists but no lot has been drawn yet.
    AwaitingStart,
    /// A lot is open and nobody has bid on it; no countdown is running.
    LotOpenIdle,
    /// A lot is open with at least one bid and the countdown is running.
    LotOpenTimed,
    /// The current lot is being settled and the next one drawn.
    Finalizing,
    /// Every team has been auctioned.
    PoolExhausted,
}

/// Events that drive [`AuctionPhase`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionEvent {
    /// A lot was drawn from the pool.
    LotDrawn,
    /// The pool had nothing left to draw.
    PoolEmpty,
    /// A bid was accepted on the open lot.
    BidPlaced,
    /// The open lot is being closed (countdown expired or explicit finalize).
    Finalize,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the game was in when the event was received.
    pub from: AuctionPhase,
    /// Event that was rejected.
    pub event: AuctionEvent,
}

impl AuctionPhase {
    /// Compute the phase reached by applying `event`.
    pub fn next(self, event: AuctionEvent) -> Result<Self, InvalidTransition> {
        let next = match (self, event) {
            (Self::AwaitingStart | Self::Finalizing, AuctionEvent::LotDrawn) => Self::LotOpenIdle,
            (Self::AwaitingStart | Self::Finalizing, AuctionEvent::PoolEmpty) => {
                Self::PoolExhausted
            }
            (Self::LotOpenIdle | Self::LotOpenTimed, AuctionEvent::BidPlaced) => Self::LotOpenTimed,
            (Self::LotOpenIdle | Self::LotOpenTimed, AuctionEvent::Finalize) => Self::Finalizing,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(phase: AuctionPhase, event: AuctionEvent) -> AuctionPhase {
        phase.next(event).unwrap()
    }

    #[test]
    fn full_lot_cycle() {
        let phase = apply(AuctionPhase::AwaitingStart, AuctionEvent::LotDrawn);
        assert_eq!(phase, AuctionPhase::LotOpenIdle);

        let phase = apply(phase, AuctionEvent::BidPlaced);
        assert_eq!(phase, AuctionPhase::LotOpenTimed);

        let phase = apply(phase, AuctionEvent::BidPlaced);
        assert_eq!(phase, AuctionPhase::LotOpenTimed);

        let phase = apply(phase, AuctionEvent::Finalize);
        assert_eq!(phase, AuctionPhase::Finalizing);

        assert_eq!(
            apply(phase, AuctionEvent::LotDrawn),
            AuctionPhase::LotOpenIdle
        );
        assert_eq!(
            apply(phase, AuctionEvent::PoolEmpty),
            AuctionPhase::PoolExhausted
        );
    }

    #[test]
    fn idle_lot_can_be_finalized() {
        assert_eq!(
            apply(AuctionPhase::LotOpenIdle, AuctionEvent::Finalize),
            AuctionPhase::Finalizing
        );
    }

    #[test]
    fn exhausted_pool_rejects_bids() {
        let err = AuctionPhase::PoolExhausted
            .next(AuctionEvent::BidPlaced)
            .unwrap_err();
        assert_eq!(err.from, AuctionPhase::PoolExhausted);
        assert_eq!(err.event, AuctionEvent::BidPlaced);
    }

    #[test]
    fn finalizing_rejects_bids() {
        assert!(
            AuctionPhase::Finalizing
                .next(AuctionEvent::BidPlaced)
                .is_err()
        );
    }
}
