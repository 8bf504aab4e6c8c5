//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

type IpGovernorLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn governor(per_second: u64, burst_size: u32) -> IpGovernorLayer {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(per_second)
            .burst_size(burst_size)
            .finish()
            .expect("non-zero rate limit quota"),
    );

    GovernorLayer::new(governor_conf)
}

/// Rate limiter for public endpoints: 2 requests per second, burst of 100,
/// keyed by the peer IP address.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
pub fn layer() -> IpGovernorLayer {
    governor(2, 100)
}

/// Stricter limiter for credential and mutation endpoints: 1 request per
/// second, burst of 10. Slows down password guessing on `/v1/user/token`.
pub fn secure_layer() -> IpGovernorLayer {
    governor(1, 10)
}
