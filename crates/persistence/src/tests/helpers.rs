// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{AuctionStore, Database, VersionedAuction};
use hive_auction_domain::{AuctionStatus, AuctionTerms, EventId};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

pub fn base_time() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
}

pub fn test_terms() -> AuctionTerms {
    AuctionTerms::new(
        String::from("Stage banner"),
        String::from("Banner placement above the main stage"),
        100,
        10,
        60,
    )
}

pub fn open_database() -> Arc<Mutex<Database>> {
    Arc::new(Mutex::new(Database::new_in_memory().unwrap()))
}

pub async fn open_store(db: &Arc<Mutex<Database>>) -> Arc<AuctionStore> {
    Arc::new(AuctionStore::load(db.clone()).await.unwrap())
}

pub async fn create_active_auction(store: &AuctionStore) -> VersionedAuction {
    store
        .create_auction(
            EventId::new("evt-1"),
            test_terms(),
            AuctionStatus::Active,
            base_time(),
        )
        .await
        .unwrap()
}
