// ==========================================
// Repository 集成测试
// ==========================================
// 测试范围:
// 1. 计费期间: 去重、排序、级联删除
// 2. 单据 / 抄表: 按键覆写
// 3. 计算结果: 整期替换、缴费记录合并
// 4. 约束错误分类
// ==========================================

mod test_helpers;

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use rental_billing::db::open_sqlite_connection;
use rental_billing::repository::error::RepositoryError;
use rental_billing::repository::{
    calculation_repo::CalculationRepository, payment_repo::PaymentRepository,
    period_repo::ElectricityPeriodRepository, reading_repo::ElectricityReadingRepository,
};
use rental_billing::{
    AllocationEngine, AllocationOutcome, BillingPeriod, CalculationSummary, ElectricityPayment,
    MasterBill, MeterReading, PaymentStatus,
};
use tempfile::NamedTempFile;
use test_helpers::{create_test_db, standard_bills, standard_readings};

struct Repos {
    period: ElectricityPeriodRepository,
    reading: ElectricityReadingRepository,
    calculation: CalculationRepository,
    payment: PaymentRepository,
    _temp_file: NamedTempFile,
}

fn setup() -> Repos {
    let (temp_file, db_path) = create_test_db().expect("无法创建测试数据库");
    let conn = Arc::new(Mutex::new(
        open_sqlite_connection(&db_path).expect("无法打开数据库"),
    ));
    Repos {
        period: ElectricityPeriodRepository::from_connection(conn.clone()),
        reading: ElectricityReadingRepository::from_connection(conn.clone()),
        calculation: CalculationRepository::from_connection(conn.clone()),
        payment: PaymentRepository::from_connection(conn),
        _temp_file: temp_file,
    }
}

fn period(year: i32, from: u32, to: u32) -> BillingPeriod {
    BillingPeriod::new(year, from, to).expect("期间不合法")
}

fn summary_of(period_id: i64, outcome: &AllocationOutcome, run_id: &str) -> CalculationSummary {
    CalculationSummary {
        period_id,
        run_id: run_id.to_string(),
        unit_price: outcome.unit_price,
        master_total_cost: outcome.master_total_cost,
        master_total_kwh: outcome.master_total_kwh,
        shared_metered_kwh: outcome.shared_metered_kwh,
        public_kwh: outcome.public_kwh,
        public_per_room: outcome.public_per_room,
        total_fee: outcome.total_fee(),
        reason: "{}".to_string(),
        notes: None,
        calculated_at: Local::now().naive_local(),
    }
}

// ==========================================
// 计费期间
// ==========================================

#[test]
fn test_period_find_or_create_去重() {
    let repos = setup();
    let id1 = repos.period.find_or_create(&period(2025, 1, 2)).unwrap();
    let id2 = repos.period.find_or_create(&period(2025, 1, 2)).unwrap();
    repos.period.find_or_create(&period(2024, 11, 12)).unwrap();
    repos.period.find_or_create(&period(2025, 3, 4)).unwrap();

    assert_eq!(id1, id2);

    let found = repos
        .period
        .find_by_period(&period(2025, 1, 2))
        .unwrap()
        .expect("应该存在");
    assert_eq!(found.id, id1);

    let order: Vec<String> = repos
        .period
        .list_all()
        .unwrap()
        .iter()
        .map(|p| p.period.to_string())
        .collect();
    assert_eq!(order, vec!["2025/03-04", "2025/01-02", "2024/11-12"]);
}

#[test]
fn test_period_delete_级联删除() {
    let repos = setup();
    let period_id = repos.period.find_or_create(&period(2025, 3, 4)).unwrap();
    repos
        .reading
        .upsert_master_bills(period_id, &standard_bills())
        .unwrap();
    repos
        .reading
        .upsert_meter_readings(period_id, &standard_readings())
        .unwrap();

    let outcome = AllocationEngine::default()
        .allocate(&standard_bills(), &standard_readings())
        .unwrap();
    repos
        .calculation
        .save_calculation(
            period_id,
            &outcome.results,
            &summary_of(period_id, &outcome, "run-1"),
        )
        .unwrap();

    repos.period.delete(period_id).unwrap();

    assert!(repos.reading.find_master_bills(period_id).unwrap().is_empty());
    assert!(repos.reading.find_meter_readings(period_id).unwrap().is_empty());
    assert!(repos.calculation.find_results(period_id).unwrap().is_empty());
    assert!(repos.calculation.find_summary(period_id).unwrap().is_none());
    assert!(repos.payment.find_by_period(period_id).unwrap().is_empty());

    assert!(matches!(
        repos.period.delete(period_id),
        Err(RepositoryError::NotFound { .. })
    ));
}

// ==========================================
// 单据与抄表
// ==========================================

#[test]
fn test_readings_按键覆写() {
    let repos = setup();
    let period_id = repos.period.find_or_create(&period(2025, 3, 4)).unwrap();

    repos
        .reading
        .upsert_master_bills(period_id, &[MasterBill::new("2F", 100.0, 20.0)])
        .unwrap();
    repos
        .reading
        .upsert_master_bills(
            period_id,
            &[
                MasterBill::new("2F", 300.0, 60.0),
                MasterBill::new("3F", 50.0, 10.0),
            ],
        )
        .unwrap();
    let bills = repos.reading.find_master_bills(period_id).unwrap();
    assert_eq!(
        bills,
        vec![
            MasterBill::new("2F", 300.0, 60.0),
            MasterBill::new("3F", 50.0, 10.0),
        ]
    );

    repos
        .reading
        .upsert_meter_readings(period_id, &[MeterReading::new(" 2A ", 1.0, 2.0)])
        .unwrap();
    repos
        .reading
        .upsert_meter_readings(period_id, &[MeterReading::new("2A", 10.0, 20.5)])
        .unwrap();
    assert_eq!(
        repos.reading.find_meter_readings(period_id).unwrap(),
        vec![MeterReading::new("2A", 10.0, 20.5)]
    );
}

#[test]
fn test_readings_期间不存在_外键错误() {
    let repos = setup();
    let result = repos
        .reading
        .upsert_master_bills(999, &[MasterBill::new("2F", 1.0, 1.0)]);
    assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
}

// ==========================================
// 计算结果与缴费记录
// ==========================================

#[test]
fn test_save_calculation_整期替换() {
    let repos = setup();
    let period_id = repos.period.find_or_create(&period(2025, 3, 4)).unwrap();
    let engine = AllocationEngine::default();

    let first = engine
        .allocate(&standard_bills(), &standard_readings())
        .unwrap();
    let written = repos
        .calculation
        .save_calculation(
            period_id,
            &first.results,
            &summary_of(period_id, &first, "run-1"),
        )
        .unwrap();
    assert_eq!(written, 11);

    // 第二次只剩 1A 与 2A
    let second = engine
        .allocate(
            &standard_bills(),
            &[
                MeterReading::new("1A", 0.0, 10.0),
                MeterReading::new("2A", 0.0, 10.0),
            ],
        )
        .unwrap();
    repos
        .calculation
        .save_calculation(
            period_id,
            &second.results,
            &summary_of(period_id, &second, "run-2"),
        )
        .unwrap();

    let results = repos.calculation.find_results(period_id).unwrap();
    assert_eq!(results, second.results);

    let summary = repos.calculation.find_summary(period_id).unwrap().unwrap();
    assert_eq!(summary.run_id, "run-2");
    assert_eq!(summary.total_fee, second.total_fee());

    let rooms: Vec<String> = repos
        .payment
        .find_by_period(period_id)
        .unwrap()
        .into_iter()
        .map(|p| p.room)
        .collect();
    assert_eq!(rooms, vec!["1A", "2A"]);
}

#[test]
fn test_save_calculation_已收款记录保留() {
    let repos = setup();
    let period_id = repos.period.find_or_create(&period(2025, 3, 4)).unwrap();
    let engine = AllocationEngine::default();

    let first = engine
        .allocate(&standard_bills(), &standard_readings())
        .unwrap();
    repos
        .calculation
        .save_calculation(
            period_id,
            &first.results,
            &summary_of(period_id, &first, "run-1"),
        )
        .unwrap();

    let mut paid = repos.payment.find(period_id, "4C").unwrap().unwrap();
    paid.paid_amount = 300;
    paid.status = PaymentStatus::Partial;
    paid.payment_date = NaiveDate::from_ymd_opt(2025, 5, 1);
    repos.payment.update_payment(&paid).unwrap();

    // 4C 改为未抄表后重算
    let mut readings = standard_readings();
    readings.push(MeterReading::placeholder("4C"));
    let second = engine.allocate(&standard_bills(), &readings).unwrap();
    repos
        .calculation
        .save_calculation(
            period_id,
            &second.results,
            &summary_of(period_id, &second, "run-2"),
        )
        .unwrap();

    assert!(second.result_for("4C").is_none());
    // 已有收款的记录不删除
    let kept = repos.payment.find(period_id, "4C").unwrap().expect("应该保留");
    assert_eq!(kept.paid_amount, 300);

    // 其余房间的已缴金额 / 日期不被覆盖
    let p2a = repos.payment.find(period_id, "2A").unwrap().unwrap();
    assert_eq!(p2a.calculated_fee, second.result_for("2A").unwrap().fee);
    assert_eq!(p2a.paid_amount, 0);
}

#[test]
fn test_save_calculation_按已缴金额重新推导状态() {
    let repos = setup();
    let period_id = repos.period.find_or_create(&period(2025, 3, 4)).unwrap();
    let engine = AllocationEngine::default();

    let first = engine
        .allocate(&standard_bills(), &standard_readings())
        .unwrap();
    repos
        .calculation
        .save_calculation(
            period_id,
            &first.results,
            &summary_of(period_id, &first, "run-1"),
        )
        .unwrap();

    // 1A 应缴 500，先缴 300
    let mut partial = repos.payment.find(period_id, "1A").unwrap().unwrap();
    assert_eq!(partial.calculated_fee, 500);
    partial.paid_amount = 300;
    partial.status = PaymentStatus::Partial;
    partial.payment_date = NaiveDate::from_ymd_opt(2025, 5, 1);
    partial.notes = Some("转账".to_string());
    repos.payment.update_payment(&partial).unwrap();

    // 1A 读数更正为 40 度 → 应缴 200，已缴 300 视为缴清
    let mut readings = standard_readings();
    readings.push(MeterReading::new("1A", 0.0, 40.0));
    let second = engine.allocate(&standard_bills(), &readings).unwrap();
    let summary = summary_of(period_id, &second, "run-2");
    repos
        .calculation
        .save_calculation(period_id, &second.results, &summary)
        .unwrap();

    let p1a = repos.payment.find(period_id, "1A").unwrap().unwrap();
    assert_eq!(p1a.calculated_fee, 200);
    assert_eq!(p1a.paid_amount, 300);
    assert_eq!(p1a.status, PaymentStatus::Paid);
    assert_eq!(p1a.payment_date, NaiveDate::from_ymd_opt(2025, 5, 1));
    assert_eq!(p1a.notes.as_deref(), Some("转账"));

    let p2a = repos.payment.find(period_id, "2A").unwrap().unwrap();
    assert_eq!(p2a.status, PaymentStatus::Unpaid);
}

#[test]
fn test_update_payment_不存在() {
    let repos = setup();
    let period_id = repos.period.find_or_create(&period(2025, 3, 4)).unwrap();
    let payment = ElectricityPayment {
        period_id,
        room: "2A".to_string(),
        calculated_fee: 100,
        paid_amount: 100,
        status: PaymentStatus::Paid,
        payment_date: None,
        notes: None,
        updated_at: Local::now().naive_local(),
    };
    assert!(matches!(
        repos.payment.update_payment(&payment),
        Err(RepositoryError::NotFound { .. })
    ));
}
