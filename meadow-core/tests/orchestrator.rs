use std::time::Duration;

use meadow_core::testing::{FakeSurface, RecordingScheduler};
use meadow_core::{
    Bot, BotConfig, BotState, DecisionOutcome, KeyValueStore, MaintenanceAction, MemoryStore,
    OfferId, OfferKind, PurchaseReason, RawOffer, RecordingSink, STORE_KEY, StoreDocument,
    Target, TaskKind, Transient,
};

const DOC: &str = r#"{"_state": {
    "pointsByItem": {"0": 600, "1": 400},
    "purchasedItems": {
        "0": {"upgrades": {"0": 1, "1": 1, "2": 1, "3": 1, "4": 1}, "metadata": {"level": 3}}
    },
    "itemContributions": {"0": 2, "1": 8}
}}"#;

type TestBot = Bot<FakeSurface, MemoryStore, RecordingSink>;

fn quiet_config() -> BotConfig {
    BotConfig {
        upgrade_chance: 0.0,
        stuck_threshold_secs: 0,
        priority_items: Vec::new(),
        ..BotConfig::default()
    }
}

fn bot_with(config: BotConfig) -> TestBot {
    let surface = FakeSurface::new();
    surface.set_points("1,000");
    surface.set_offers(
        OfferKind::Purchase,
        vec![
            RawOffer::new("Seed Bag", "100", true),
            RawOffer::new("Sprinkler", "300", true),
        ],
    );
    Bot::new(
        surface,
        MemoryStore::with_value(STORE_KEY, DOC),
        config,
        RecordingSink::default(),
        7,
    )
}

#[tokio::test]
async fn start_registers_four_tasks_and_reports() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;

    assert_eq!(bot.state(), BotState::Running);
    assert!(bot.stats().active);
    assert_eq!(scheduler.active.len(), 4);
    assert_eq!(scheduler.active[&TaskKind::Click], Duration::from_millis(10));
    assert_eq!(scheduler.active[&TaskKind::Scan], Duration::from_millis(250));
    assert_eq!(scheduler.active[&TaskKind::Decision], Duration::from_millis(500));
    assert_eq!(scheduler.active[&TaskKind::Status], Duration::from_millis(3000));
    assert_eq!(bot.sink().reports.len(), 1);
    assert_eq!(bot.sink().reports[0].points, 1000);
    assert_eq!(bot.sink().reports[0].current_level, 3);
    assert_eq!(bot.mirror().summary().unwrap().total_points, 1000);
}

#[tokio::test]
async fn restart_resets_counters_and_stray_tasks() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    bot.on_tick(TaskKind::Click).await;
    assert_eq!(bot.stats().total_clicks, 1);

    bot.start(&mut scheduler).await;
    assert_eq!(bot.stats().total_clicks, 0);
    assert_eq!(scheduler.active.len(), 4);
    assert_eq!(scheduler.registrations.len(), 8);
}

#[tokio::test]
async fn stop_cancels_everything_and_summarizes() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    bot.on_tick(TaskKind::Click).await;
    bot.on_tick(TaskKind::Click).await;
    bot.stop(&mut scheduler);

    assert_eq!(bot.state(), BotState::Stopped);
    assert!(!bot.stats().active);
    assert!(scheduler.active.is_empty());
    assert_eq!(bot.sink().summaries.len(), 1);
    assert_eq!(bot.sink().summaries[0].total_clicks, 2);

    // A firing that races the cancellation does nothing.
    bot.on_tick(TaskKind::Click).await;
    assert_eq!(bot.stats().total_clicks, 2);

    bot.stop(&mut scheduler);
    assert_eq!(bot.sink().summaries.len(), 1);
    assert_eq!(bot.sink().notices.last().unwrap(), "Bot is not running");
}

#[tokio::test]
async fn click_interval_changes_only_touch_click_task() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    scheduler.registrations.clear();
    scheduler.cancellations.clear();

    assert!(!bot.set_click_interval("0", &mut scheduler));
    assert!(!bot.set_click_interval("soon", &mut scheduler));
    assert!(scheduler.registrations.is_empty());
    assert!(scheduler.cancellations.is_empty());
    assert!(bot.sink().notices.last().unwrap().contains("invalid interval"));
    assert_eq!(bot.config().click_interval, 10);

    assert!(bot.set_click_interval("25", &mut scheduler));
    assert_eq!(scheduler.cancellations, vec![TaskKind::Click]);
    assert_eq!(
        scheduler.registrations,
        vec![(TaskKind::Click, Duration::from_millis(25))]
    );
    assert_eq!(scheduler.active.len(), 4);
    assert_eq!(scheduler.active[&TaskKind::Decision], Duration::from_millis(500));
}

#[tokio::test]
async fn click_interval_while_stopped_only_updates_config() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    assert!(bot.set_click_interval("40", &mut scheduler));
    assert!(scheduler.registrations.is_empty());
    assert_eq!(bot.config().click_interval, 40);
}

#[tokio::test]
async fn toggles_report_unknown_names() {
    let mut bot = bot_with(quiet_config());
    assert_eq!(bot.toggle_option("finishGame"), Some(true));
    assert_eq!(bot.toggle_option("warpSpeed"), None);
    assert!(bot.sink().notices.last().unwrap().contains("unknown option: warpSpeed"));
    assert!(!bot.toggle_upgrade_auto());
    assert!(!bot.config().auto_upgrade);
}

#[tokio::test]
async fn decision_buys_most_efficient_offer_once() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;

    let outcome = bot.decision_tick().await.unwrap();
    let DecisionOutcome::Purchased(decision) = outcome else {
        panic!("expected a purchase, got {outcome:?}");
    };
    assert_eq!(decision.offer.id, OfferId(1));
    assert_eq!(decision.reason, PurchaseReason::BestValue);
    assert_eq!(
        bot.surface().clicks(),
        vec![Target::Offer {
            kind: OfferKind::Purchase,
            id: OfferId(1)
        }]
    );
    assert_eq!(bot.stats().purchases, 1);
}

#[tokio::test]
async fn maintenance_preempts_purchases() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    bot.surface().set_transient(Transient::Reward, 1);
    bot.surface().set_transient(Transient::Lootbox, 1);

    assert_eq!(
        bot.decision_tick().await.unwrap(),
        DecisionOutcome::Maintenance(MaintenanceAction::CollectReward)
    );
    assert_eq!(
        bot.decision_tick().await.unwrap(),
        DecisionOutcome::Maintenance(MaintenanceAction::CollectLootbox)
    );
    assert!(matches!(
        bot.decision_tick().await.unwrap(),
        DecisionOutcome::Purchased(_)
    ));
    assert_eq!(bot.stats().level_rewards_claimed, 1);
    assert_eq!(bot.stats().lootboxes_collected, 1);
}

#[tokio::test]
async fn disabled_maintenance_does_not_click() {
    let mut config = quiet_config();
    config.collect_level_rewards = false;
    let mut bot = bot_with(config);
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    bot.surface().set_transient(Transient::Reward, 1);

    assert!(matches!(
        bot.decision_tick().await.unwrap(),
        DecisionOutcome::Purchased(_)
    ));
    assert_eq!(bot.stats().level_rewards_claimed, 0);
}

#[tokio::test]
async fn scan_removes_weeds_and_never_clicks_lawnmowers() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    bot.surface().set_transient(Transient::Weed, 2);
    bot.surface().set_transient(Transient::Hazard, 1);

    bot.scan_tick().await.unwrap();
    bot.scan_tick().await.unwrap();
    bot.scan_tick().await.unwrap();

    assert_eq!(bot.stats().weeds_removed, 2);
    assert_eq!(bot.stats().lawnmowers_avoided, 1);
    assert!(
        bot.surface()
            .clicks()
            .iter()
            .all(|target| !matches!(target, Target::Transient { kind: Transient::Hazard, .. }))
    );
}

#[tokio::test]
async fn finish_mode_holds_points_for_final_offer() {
    let mut config = quiet_config();
    config.finish_game = true;
    let mut bot = bot_with(config);
    bot.surface().set_offers(
        OfferKind::Purchase,
        vec![
            RawOffer::new("Seed Bag", "100", true),
            RawOffer::new("Final Bloom", "5,000", true),
        ],
    );
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    bot.scan_tick().await.unwrap();
    assert!(bot.final_available());

    assert_eq!(
        bot.decision_tick().await.unwrap(),
        DecisionOutcome::HeldForFinal
    );
    assert!(bot.surface().clicks().is_empty());

    bot.surface().set_points("5,000");
    let outcome = bot.decision_tick().await.unwrap();
    let DecisionOutcome::Purchased(decision) = outcome else {
        panic!("expected the final purchase, got {outcome:?}");
    };
    assert_eq!(decision.reason, PurchaseReason::FinalItem);
    assert_eq!(decision.offer.id, OfferId(1));
}

#[tokio::test]
async fn malformed_store_write_keeps_previous_summary() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    let before = bot.mirror().summary().cloned();

    bot.store().backend().external_write(STORE_KEY, "{not json");
    bot.decision_tick().await.unwrap();
    assert_eq!(bot.mirror().summary().cloned(), before);

    bot.store().backend().external_write(
        STORE_KEY,
        r#"{"_state": {"pointsByItem": {"0": 5}, "purchasedItems": {}}}"#,
    );
    bot.scan_tick().await.unwrap();
    assert_eq!(bot.mirror().summary().unwrap().total_points, 5);
}

#[tokio::test]
async fn repeated_points_trigger_one_unstick() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    assert_eq!(bot.store().backend().own_writes(), 0);

    bot.status_tick().await.unwrap();
    assert_eq!(bot.stats().unstick_patches, 1);
    assert_eq!(bot.store().backend().own_writes(), 1);
    assert_eq!(bot.mirror().summary().unwrap().total_points, 1050);

    let raw = bot.store().backend().get(STORE_KEY).await.unwrap().unwrap();
    let doc = StoreDocument::parse(&raw).unwrap();
    assert_eq!(doc.state.unlocked_achievements.unwrap(), (0..10).collect::<Vec<_>>());

    bot.surface().set_points("1,200");
    bot.status_tick().await.unwrap();
    assert_eq!(bot.stats().unstick_patches, 1);
}

#[tokio::test]
async fn forced_reports_while_stopped_never_unstick() {
    let mut bot = bot_with(quiet_config());
    bot.status().await;
    bot.status().await;
    bot.status().await;
    assert_eq!(bot.sink().reports.len(), 3);
    assert_eq!(bot.stats().unstick_patches, 0);
    assert_eq!(bot.store().backend().own_writes(), 0);
}

#[tokio::test]
async fn restart_skips_writes_queued_while_stopped() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    bot.stop(&mut scheduler);
    let updates = bot.mirror().updates();

    let backend = bot.store().backend();
    backend.external_write(
        STORE_KEY,
        r#"{"_state": {"pointsByItem": {"0": 10}, "purchasedItems": {}}}"#,
    );
    backend.external_write(STORE_KEY, "{not json");
    backend.external_write(
        STORE_KEY,
        r#"{"_state": {"pointsByItem": {"0": 30}, "purchasedItems": {}}}"#,
    );

    bot.start(&mut scheduler).await;
    assert_eq!(bot.mirror().updates(), updates + 1);
    assert_eq!(bot.mirror().summary().unwrap().total_points, 30);
    assert!(
        bot.store()
            .backend()
            .drain_writes(STORE_KEY)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn upgrade_chance_patches_store_when_enabled() {
    let mut config = quiet_config();
    config.upgrade_chance = 1.0;
    let mut bot = bot_with(config);
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;

    bot.decision_tick().await.unwrap();
    assert_eq!(bot.stats().upgrade_patches, 1);
    assert_eq!(bot.store().backend().own_writes(), 1);
    let upgrades = &bot.mirror().summary().unwrap().purchased_items["0"];
    assert_eq!(upgrades["0"], 2);

    bot.toggle_upgrade_auto();
    bot.decision_tick().await.unwrap();
    assert_eq!(bot.stats().upgrade_patches, 1);
}

#[tokio::test]
async fn surface_failures_degrade_to_no_op() {
    let mut bot = bot_with(quiet_config());
    let mut scheduler = RecordingScheduler::default();
    bot.start(&mut scheduler).await;
    bot.surface().set_failing(true);

    for task in TaskKind::ALL {
        bot.on_tick(task).await;
    }
    assert!(bot.decision_tick().await.is_err());
    assert_eq!(bot.stats().total_clicks, 0);
    assert_eq!(bot.stats().purchases, 0);
    assert_eq!(bot.state(), BotState::Running);
}
