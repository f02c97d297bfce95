//! Long-polling transport (`polling` and `accelerator` modes).

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use crate::dispatch::{self, BotHandlers, UpdateLimit};

/// Run teloxide's dispatcher until Ctrl-C.
///
/// With `concurrent_updates == 1` every update goes through a single worker,
/// so updates are handled strictly in arrival order. Otherwise teloxide
/// runs one worker per chat and [`UpdateLimit`] lets at most
/// `concurrent_updates` of them work at once.
pub async fn run(bot: Bot, handlers: Arc<BotHandlers>, concurrent_updates: usize) {
    info!("📡 Starting long polling (concurrent_updates = {})", concurrent_updates);

    let builder = Dispatcher::builder(bot, dispatch::schema())
        .dependencies(dptree::deps![handlers, UpdateLimit::new(concurrent_updates)])
        .enable_ctrlc_handler();

    if concurrent_updates == 1 {
        builder
            .distribution_function(|_| Some(()))
            .build()
            .dispatch()
            .await;
    } else {
        builder.build().dispatch().await;
    }

    info!("Polling stopped");
}
