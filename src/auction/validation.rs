/// 경매 상태 전이 검증
/// 로그의 마지막 항목(tail)만 보고 제안의 적법성을 판단하는 순수 함수
// region:    --- Imports
use super::events::{AuctionEvent, PeerIdentity, Proposal};
use crate::error::RejectReason;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Evaluate
/// 제안을 현재 tail에 대해 평가하고, 수락 시 기록될 이벤트를 반환
pub fn evaluate(
    tail: Option<&AuctionEvent>,
    actor: &PeerIdentity,
    proposal: &Proposal,
    now: DateTime<Utc>,
) -> Result<AuctionEvent, RejectReason> {
    let name = proposal.name().to_string();
    let price = proposal.price();

    match (tail, proposal) {
        // 최초 개설
        (None, Proposal::Open { .. }) => Ok(AuctionEvent::Open {
            name,
            owner: actor.clone(),
            price,
            timestamp: now,
        }),
        (None, _) => Err(RejectReason::AuctionNotFound),

        // 종료 후 재개설: 낙찰자만 가능
        (Some(AuctionEvent::Close { winner, .. }), Proposal::Open { .. }) => {
            if winner != actor {
                return Err(RejectReason::ReopenForbidden);
            }
            Ok(AuctionEvent::Open {
                name,
                owner: actor.clone(),
                price,
                timestamp: now,
            })
        }
        (Some(AuctionEvent::Close { .. }), _) => Err(RejectReason::AuctionClosed),

        // 진행 중인 경매는 다시 열 수 없음
        (Some(_), Proposal::Open { .. }) => Err(RejectReason::ReopenForbidden),

        (Some(tail), Proposal::Bid { .. }) => {
            if price <= tail.price() {
                return Err(RejectReason::PriceNotHigher {
                    offered: price,
                    current: tail.price(),
                });
            }
            Ok(AuctionEvent::Bid {
                name,
                seller: tail.owner_field().clone(),
                bidder: actor.clone(),
                price,
                timestamp: now,
            })
        }

        (Some(tail), Proposal::Close { .. }) => {
            // 진행 중인 tail의 소유자 필드는 항상 판매자
            let seller = tail.owner_field();
            if seller != actor {
                return Err(RejectReason::NotOwner {
                    owner: seller.clone(),
                });
            }
            if price != tail.price() {
                return Err(RejectReason::PriceMismatch {
                    offered: price,
                    expected: tail.price(),
                });
            }
            Ok(AuctionEvent::Close {
                name,
                winner: tail.actor_field().clone(),
                closer: actor.clone(),
                price,
                timestamp: now,
            })
        }
    }
}

// endregion: --- Evaluate
