// ==========================================
// PaymentApi 集成测试
// ==========================================
// 测试范围:
// 1. 缴费记录查询（按房间配置顺序）
// 2. 登记收款: 状态推导、缴费日期、备注
// 3. 期间收缴汇总
// ==========================================

mod test_helpers;

use chrono::{Local, NaiveDate};
use rental_billing::api::ApiError;
use rental_billing::PaymentStatus;
use test_helpers::{standard_bills, standard_readings, TestEnv};

/// 建立一个已完成计算的期间
fn calculated_period(env: &TestEnv) -> i64 {
    let api = &env.state.electricity_api;
    let period_id = api.create_period(2025, 3, 4).expect("创建失败");
    api.calculate_and_save(period_id, &standard_bills(), &standard_readings(), None)
        .expect("计算失败");
    period_id
}

#[test]
fn test_list_payments_按房间顺序() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let period_id = calculated_period(&env);

    let payments = env
        .state
        .payment_api
        .list_payments(period_id)
        .expect("查询失败");
    let rooms: Vec<&str> = payments.iter().map(|p| p.room.as_str()).collect();
    assert_eq!(
        rooms,
        vec!["1A", "1B", "2A", "2B", "3A", "3B", "3C", "3D", "4A", "4B", "4C"]
    );
}

#[test]
fn test_list_payments_期间不存在() {
    let env = TestEnv::new().expect("无法创建测试环境");
    assert!(matches!(
        env.state.payment_api.list_payments(42),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_record_payment_状态推导() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let period_id = calculated_period(&env);
    let payment_api = &env.state.payment_api;

    let partial = payment_api
        .record_payment(period_id, "2A", 500, None, None)
        .expect("登记失败");
    assert_eq!(partial.status, PaymentStatus::Partial);
    assert_eq!(partial.balance(), 525);
    // 未指定日期时取今天
    assert_eq!(partial.payment_date, Some(Local::now().date_naive()));

    let date = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
    let paid = payment_api
        .record_payment(period_id, "2A", 1025, Some(date), Some("转账"))
        .expect("登记失败");
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(paid.balance(), 0);
    assert_eq!(paid.payment_date, Some(date));
    assert_eq!(paid.notes.as_deref(), Some("转账"));

    // 改回 0: 状态回到未缴，日期清空，备注保留
    let reset = payment_api
        .record_payment(period_id, "2A", 0, None, None)
        .expect("登记失败");
    assert_eq!(reset.status, PaymentStatus::Unpaid);
    assert_eq!(reset.payment_date, None);
    assert_eq!(reset.notes.as_deref(), Some("转账"));

    let stored = payment_api
        .list_payments(period_id)
        .expect("查询失败")
        .into_iter()
        .find(|p| p.room == "2A")
        .expect("缺少 2A");
    assert_eq!(stored.paid_amount, 0);
    assert_eq!(stored.status, PaymentStatus::Unpaid);
    assert_eq!(stored.payment_date, None);
    assert_eq!(stored.notes, reset.notes);
}

#[test]
fn test_record_payment_输入校验() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let period_id = calculated_period(&env);
    let payment_api = &env.state.payment_api;

    assert!(matches!(
        payment_api.record_payment(period_id, "2A", -1, None, None),
        Err(ApiError::InvalidInput(_))
    ));
    // 4D 未抄表，没有缴费记录
    assert!(matches!(
        payment_api.record_payment(period_id, "4D", 100, None, None),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_payment_summary() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let period_id = calculated_period(&env);
    let payment_api = &env.state.payment_api;

    payment_api
        .record_payment(period_id, "1A", 500, None, None)
        .expect("登记失败");
    payment_api
        .record_payment(period_id, "2A", 500, None, None)
        .expect("登记失败");

    let summary = payment_api
        .get_payment_summary(period_id)
        .expect("查询失败");
    assert_eq!(summary.total_due, 10125);
    assert_eq!(summary.total_paid, 1000);
    assert_eq!(summary.total_balance, 9125);
    assert_eq!(summary.paid_rooms, 1);
    assert_eq!(summary.partial_rooms, 1);
    assert_eq!(summary.unpaid_rooms, 9);
    assert_eq!(summary.collection_rate, 9.9);
}

#[test]
fn test_payment_summary_尚未计算() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let period_id = env
        .state
        .electricity_api
        .create_period(2025, 1, 2)
        .expect("创建失败");

    let summary = env
        .state
        .payment_api
        .get_payment_summary(period_id)
        .expect("查询失败");
    assert_eq!(summary.total_due, 0);
    assert_eq!(summary.collection_rate, 0.0);
}
