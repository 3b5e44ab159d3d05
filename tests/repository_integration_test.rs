// ==========================================
// 仓储层集成测试
// ==========================================
// 职责: 验证 SQLite 仓储的持久化往返与修订只增约束
// 场景: 目录/配筋往返, 修订编号与取代, 结果集往返
// ==========================================


use chrono::{Duration, NaiveDate, Utc};
use rebar_aps::domain::bundle::{Bundle, Lot};
use rebar_aps::domain::order::{InfeasibleOrder, ProcurementOrder, ScheduleOutcome};
use rebar_aps::domain::pattern::{CuttingPattern, PatternLineItem, PatternMetrics};
use rebar_aps::domain::revision::DiameterOutcome;
use rebar_aps::domain::types::{Diameter, Objective, OrderStatus, RevisionStatus};
use rebar_aps::repository::error::RepositoryError;
use rebar_aps::repository::revision_repo::RevisionRecord;
use rebar_aps::repository::{
    BarMarkRepository, CatalogRepository, OrderRepository, PatternRepository, RevisionRepository,
};
use std::collections::BTreeMap;
use test_helpers::{bar_mark, create_test_db, manufacturer, open_test_connection, stock_length};

// ==========================================
// 测试辅助函数
// ==========================================

fn completed_record(revision_id: &str, project_id: &str) -> RevisionRecord {
    RevisionRecord {
        revision_id: revision_id.to_string(),
        project_id: project_id.to_string(),
        revision_no: 0,
        objective: Objective::Rcw,
        status: RevisionStatus::Completed,
        created_at: Utc::now(),
        elapsed_ms: 12,
    }
}

fn computing_record(revision_id: &str, project_id: &str) -> RevisionRecord {
    RevisionRecord {
        status: RevisionStatus::Computing,
        ..completed_record(revision_id, project_id)
    }
}

fn sample_bundle(bundle_id: &str, lot_no: &str, seq: u32) -> Bundle {
    Bundle {
        bundle_id: bundle_id.to_string(),
        bar_mark: "B-01".to_string(),
        diameter: Diameter::D25,
        length_mm: 10_500,
        manufacturer_id: "M-A".to_string(),
        quantity: 50,
        bundle_size: 50,
        waste_per_piece_mm: 100.0,
        cutting_sequence_index: seq,
        lot_no: lot_no.to_string(),
    }
}

// ==========================================
// 测试1: 目录往返与 upsert 覆盖
// ==========================================
#[test]
fn test_catalog_roundtrip_and_upsert() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = CatalogRepository::new(open_test_connection(&db_path).unwrap());

    repo.upsert_manufacturer(&manufacturer("M-A", 1.9, 4.2, 14))
        .unwrap();
    repo.upsert_manufacturer(&manufacturer("M-B", 2.4, 3.9, 10))
        .unwrap();
    repo.upsert_stock_length(&stock_length("M-A", Diameter::D25, 10_500, 0.5, 14))
        .unwrap();
    repo.upsert_stock_length(&stock_length("M-B", Diameter::D25, 11_000, 0.5, 10))
        .unwrap();

    let catalog = repo.load_catalog().unwrap();
    assert_eq!(catalog.manufacturers.len(), 2);
    assert_eq!(catalog.stock_lengths.len(), 2);
    assert_eq!(catalog.manufacturer("M-A").unwrap().unit_price_per_kg, 4.2);

    // 同主键重复 upsert 覆盖旧值
    repo.upsert_stock_length(&stock_length("M-A", Diameter::D25, 10_500, 2.0, 21))
        .unwrap();
    let catalog = repo.load_catalog().unwrap();
    assert_eq!(catalog.stock_lengths.len(), 2);
    let row = catalog
        .stock_lengths
        .iter()
        .find(|r| r.manufacturer_id == "M-A" && r.length_mm == 10_500)
        .unwrap();
    assert_eq!(row.min_order_tonnage, 2.0);
    assert_eq!(row.min_lead_time_days, 21);

    repo.clear().unwrap();
    let catalog = repo.load_catalog().unwrap();
    assert!(catalog.manufacturers.is_empty());
    assert!(catalog.stock_lengths.is_empty());
}

// ==========================================
// 测试2: 配筋表全量替换往返
// ==========================================
#[test]
fn test_bar_mark_replace_all_roundtrip() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = BarMarkRepository::new(open_test_connection(&db_path).unwrap());
    let date = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

    repo.replace_all(
        "PJ001",
        &[
            bar_mark("B-02", Diameter::D13, 9_000, 30, None),
            bar_mark("B-01", Diameter::D25, 10_400, 100, Some(date)),
        ],
    )
    .unwrap();

    let marks = repo.list_by_project("PJ001").unwrap();
    assert_eq!(marks.len(), 2);
    // 符号升序
    assert_eq!(marks[0].bar_mark, "B-01");
    assert_eq!(marks[0].required_date, Some(date));
    assert_eq!(marks[1].bar_mark, "B-02");
    assert_eq!(marks[1].required_date, None);

    let found = repo.find("PJ001", "B-01").unwrap().unwrap();
    assert_eq!(found.diameter, Diameter::D25);
    assert_eq!(found.count, 100);

    // 再次导入为全量替换, 旧符号消失
    repo.replace_all("PJ001", &[bar_mark("B-03", Diameter::D25, 8_000, 5, None)])
        .unwrap();
    let marks = repo.list_by_project("PJ001").unwrap();
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].bar_mark, "B-03");

    // 其他工程不受影响
    assert!(repo.list_by_project("PJ999").unwrap().is_empty());
}

// ==========================================
// 测试3: 修订编号分配与旧修订取代
// ==========================================
#[test]
fn test_revision_numbering_and_supersession() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = RevisionRepository::new(open_test_connection(&db_path).unwrap());

    let mut r1 = computing_record("rev-001", "PJ001");
    repo.create_with_next_revision_no(&mut r1).unwrap();
    assert_eq!(r1.revision_no, 1);
    repo.mark_completed("rev-001", "PJ001").unwrap();

    let mut r2 = computing_record("rev-002", "PJ001");
    repo.create_with_next_revision_no(&mut r2).unwrap();
    assert_eq!(r2.revision_no, 2);

    // 结果尚未全部落库: 旧修订保持生效, 新修订处于计算中
    let old = repo.find_by_id("rev-001").unwrap().unwrap();
    assert_eq!(old.status, RevisionStatus::Completed);
    let new = repo.find_by_id("rev-002").unwrap().unwrap();
    assert_eq!(new.status, RevisionStatus::Computing);
    let latest = repo.latest_completed("PJ001").unwrap().unwrap();
    assert_eq!(latest.revision_id, "rev-001");

    // 收尾后旧修订被标记取代, 历史保留
    repo.mark_completed("rev-002", "PJ001").unwrap();
    let old = repo.find_by_id("rev-001").unwrap().unwrap();
    assert_eq!(old.status, RevisionStatus::Superseded);
    let new = repo.find_by_id("rev-002").unwrap().unwrap();
    assert_eq!(new.status, RevisionStatus::Completed);

    let latest = repo.latest_completed("PJ001").unwrap().unwrap();
    assert_eq!(latest.revision_id, "rev-002");

    // 非计算中修订不可重复收尾
    assert!(repo.mark_completed("rev-999", "PJ001").is_err());

    // 修订号降序时间线
    let all = repo.list_by_project("PJ001").unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].revision_no, 2);
    assert_eq!(all[1].revision_no, 1);

    // 工程间编号独立
    let mut other = completed_record("rev-100", "PJ002");
    repo.create_with_next_revision_no(&mut other).unwrap();
    assert_eq!(other.revision_no, 1);
}

// ==========================================
// 测试4: 修订只增 - 同ID重建被拒绝
// ==========================================
#[test]
fn test_revision_is_immutable_by_id() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = RevisionRepository::new(open_test_connection(&db_path).unwrap());

    let mut r1 = completed_record("rev-001", "PJ001");
    repo.create_with_next_revision_no(&mut r1).unwrap();

    let mut dup = completed_record("rev-001", "PJ001");
    let err = repo.create_with_next_revision_no(&mut dup).unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::ImmutableRevisionViolation(_)
    ));
}

// ==========================================
// 测试5: 按直径结果往返 (可行 + 不可行)
// ==========================================
#[test]
fn test_outcomes_roundtrip() {
    let (_temp, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    let repo = PatternRepository::new(conn.clone());

    // 结果表外键指向修订头, 先落修订
    let mut head = completed_record("rev-001", "PJ001");
    RevisionRepository::new(conn)
        .create_with_next_revision_no(&mut head)
        .unwrap();

    let pattern = CuttingPattern {
        diameter: Diameter::D25,
        objective: Objective::Rcw,
        required_length_mm: 1_300_000,
        line_items: vec![
            PatternLineItem {
                manufacturer_id: "M-A".to_string(),
                length_mm: 10_500,
                quantity: 106,
                waste_per_piece_mm: 0.0,
            },
            PatternLineItem {
                manufacturer_id: "M-B".to_string(),
                length_mm: 11_000,
                quantity: 17,
                waste_per_piece_mm: 0.0,
            },
        ],
        objective_score: 0.0,
    };
    let mut outcomes: BTreeMap<Diameter, DiameterOutcome> = BTreeMap::new();
    outcomes.insert(
        Diameter::D25,
        DiameterOutcome::Optimized {
            pattern,
            metrics: PatternMetrics {
                rcw_pct: 0.0,
                co2_kg: 9_830.5,
                cost: 21_730.25,
            },
        },
    );
    outcomes.insert(
        Diameter::D29,
        DiameterOutcome::Infeasible {
            reason: "无候选目录行".to_string(),
        },
    );

    repo.save_outcomes("rev-001", &outcomes).unwrap();
    let loaded = repo.load_outcomes("rev-001").unwrap();
    assert_eq!(loaded, outcomes);

    // 修订隔离
    assert!(repo.load_outcomes("rev-999").unwrap().is_empty());
}

// ==========================================
// 测试6: 捆包/批次/排程往返
// ==========================================
#[test]
fn test_order_results_roundtrip() {
    let (_temp, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    let repo = OrderRepository::new(conn.clone());

    let mut head = completed_record("rev-001", "PJ001");
    RevisionRepository::new(conn)
        .create_with_next_revision_no(&mut head)
        .unwrap();

    let bundles = vec![
        sample_bundle("PJ001-D25-L0001-B01", "PJ001-D25-L0001", 1),
        sample_bundle("PJ001-D25-L0001-B02", "PJ001-D25-L0001", 2),
    ];
    let lots = vec![Lot {
        lot_no: "PJ001-D25-L0001".to_string(),
        diameter: Diameter::D25,
        length_mm: 10_500,
        bundle_ids: bundles.iter().map(|b| b.bundle_id.clone()).collect(),
    }];

    let required = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
    let order_date = required - Duration::days(14);
    let schedule = ScheduleOutcome {
        orders: vec![ProcurementOrder {
            order_id: "PO-0001".to_string(),
            diameter: Diameter::D25,
            length_mm: 10_500,
            supplier_id: "M-A".to_string(),
            quantity: 100,
            tonnage: 4.179,
            bundle_ids: bundles.iter().map(|b| b.bundle_id.clone()).collect(),
            required_date: required,
            lead_time_days: 14,
            order_date,
            delivery_date: order_date + Duration::days(14),
            status: OrderStatus::Planned,
            delay_days: 0,
        }],
        infeasible: vec![InfeasibleOrder {
            diameter: Diameter::D13,
            length_mm: 9_000,
            tonnage: 0.268,
            bundle_ids: vec!["PJ001-D13-L0002-B01".to_string()],
            required_date: required,
            reason: "目录中无厂商供应 D13 × 9000mm".to_string(),
        }],
    };

    repo.save_results("rev-001", &bundles, &lots, &schedule)
        .unwrap();

    let loaded_bundles = repo.load_bundles("rev-001").unwrap();
    assert_eq!(loaded_bundles, bundles);

    let loaded_lots = repo.load_lots("rev-001").unwrap();
    assert_eq!(loaded_lots, lots);

    let loaded_schedule = repo.load_schedule("rev-001").unwrap();
    assert_eq!(loaded_schedule, schedule);
    assert!(loaded_schedule.is_partial());
    assert!(loaded_schedule.orders[0].dates_consistent());

    // 修订隔离
    assert!(repo.load_bundles("rev-002").unwrap().is_empty());
    assert!(repo.load_schedule("rev-002").unwrap().orders.is_empty());
}
