// ==========================================
// 门店月度排班引擎 - 时间轴工具
// ==========================================
// 职责: 分钟时刻换算、区间重叠、跨午夜归一化、日期展开
// 红线: 无状态、无副作用、无 I/O 操作
// 重叠/休息判定统一走连续时间轴, 禁止各处自行处理跨日
// ==========================================

use chrono::{Datelike, Duration, NaiveDate};

/// 每日分钟数
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// 月度折算周数 (设计简化: 不按 ISO 周界计算)
pub const WEEKS_PER_MONTH: f64 = 4.33;

/// 解析 "HH:MM" 为自午夜起的分钟数
///
/// # 返回
/// 非法格式返回 None
pub fn parse_hhmm(s: &str) -> Option<i32> {
    let (hh, mm) = s.split_once(':')?;
    let hh: i32 = hh.trim().parse().ok()?;
    let mm: i32 = mm.trim().get(..2).unwrap_or(mm.trim()).parse().ok()?;
    if !(0..=24).contains(&hh) || !(0..60).contains(&mm) {
        return None;
    }
    let minutes = hh * 60 + mm;
    if minutes > 1440 {
        return None;
    }
    Some(minutes)
}

/// 分钟时刻格式化为 "HH:MM"
pub fn format_minutes(minute: i32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// 分钟换算小时
pub fn minutes_to_hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}

/// 月累计分钟折算周等效小时
///
/// # 规则
/// weekly_equivalent = (minutes / 60) / WEEKS_PER_MONTH
pub fn weekly_equivalent_hours(total_minutes: i64) -> f64 {
    minutes_to_hours(total_minutes) / WEEKS_PER_MONTH
}

/// 同日半开区间重叠判定
///
/// # 规则
/// a_start < b_end && b_start < a_end (端点相接不算重叠)
pub fn ranges_overlap(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> bool {
    a_start < b_end && b_start < a_end
}

/// (日期, 分钟时刻) 归一化为连续时间轴上的绝对分钟
pub fn absolute_minute(date: NaiveDate, minute: i32) -> i64 {
    date.num_days_from_ce() as i64 * MINUTES_PER_DAY + minute as i64
}

/// 连续时间轴上的班次重叠判定 (跨午夜安全)
///
/// # 规则
/// 两班次先归一化为绝对分钟区间, 再按半开区间比较;
/// 相邻日班次只要不在时间轴上交叠即不冲突
pub fn spans_overlap(
    a_date: NaiveDate,
    a_start: i32,
    a_end: i32,
    b_date: NaiveDate,
    b_start: i32,
    b_end: i32,
) -> bool {
    // 相隔两天以上不可能重叠, 提前短路
    if (a_date - b_date).num_days().abs() > 1 {
        return false;
    }
    let a_s = absolute_minute(a_date, a_start);
    let a_e = absolute_minute(a_date, a_end);
    let b_s = absolute_minute(b_date, b_start);
    let b_e = absolute_minute(b_date, b_end);
    a_s < b_e && b_s < a_e
}

/// 连续时间轴上两班次之间的休息分钟数 (对称)
///
/// # 规则
/// - 仅考虑同日与相邻日 (相隔两天以上必然休息充分, 返回 None)
/// - gap = 较晚班次开始 - 较早班次结束 (绝对分钟)
/// - 两班次交叠时 gap 为负值
pub fn rest_gap_minutes(
    a_date: NaiveDate,
    a_start: i32,
    a_end: i32,
    b_date: NaiveDate,
    b_start: i32,
    b_end: i32,
) -> Option<i64> {
    if (a_date - b_date).num_days().abs() > 1 {
        return None;
    }
    let a_s = absolute_minute(a_date, a_start);
    let a_e = absolute_minute(a_date, a_end);
    let b_s = absolute_minute(b_date, b_start);
    let b_e = absolute_minute(b_date, b_end);

    if a_s <= b_s {
        Some(b_s - a_e)
    } else {
        Some(a_s - b_e)
    }
}

/// 展开闭区间日期范围
pub fn expand_date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut cur = start;
    while cur <= end {
        dates.push(cur);
        cur += Duration::days(1);
    }
    dates
}

/// 日期对应星期几 (0=周日..6=周六)
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// 是否周末 (0=周日, 6=周六)
pub fn is_weekend(dow: u8) -> bool {
    dow == 0 || dow == 6
}

/// 是否周六
pub fn is_saturday(dow: u8) -> bool {
    dow == 6
}

/// 是否周日
pub fn is_sunday(dow: u8) -> bool {
    dow == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    // ==========================================
    // 测试 1: 分钟时刻解析与格式化
    // ==========================================

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("04:25"), Some(265));
        assert_eq!(parse_hhmm("20:30"), Some(1230));
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("24:00"), Some(1440));
        // 秒数后缀按 HH:MM 截断
        assert_eq!(parse_hhmm("08:00:00"), Some(480));
        assert_eq!(parse_hhmm("25:00"), None);
        assert_eq!(parse_hhmm("bad"), None);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(265), "04:25");
        assert_eq!(format_minutes(1230), "20:30");
        assert_eq!(format_minutes(0), "00:00");
    }

    // ==========================================
    // 测试 2: 同日区间重叠 (半开区间)
    // ==========================================

    #[test]
    fn test_ranges_overlap_basic() {
        assert!(ranges_overlap(300, 720, 600, 900));
        assert!(!ranges_overlap(300, 600, 600, 900)); // 端点相接
        assert!(!ranges_overlap(300, 600, 700, 900));
        assert!(ranges_overlap(300, 900, 400, 500)); // 包含
    }

    // ==========================================
    // 测试 3: 连续时间轴重叠 (跨日)
    // ==========================================

    #[test]
    fn test_spans_overlap_same_day() {
        let day = d("2025-03-03");
        assert!(spans_overlap(day, 300, 720, day, 600, 900));
        assert!(!spans_overlap(day, 300, 600, day, 600, 900));
    }

    #[test]
    fn test_spans_overlap_adjacent_days_no_false_positive() {
        // 前日晚班 14:00-22:00 与次日早班 05:00-13:00 不重叠
        let day1 = d("2025-03-03");
        let day2 = d("2025-03-04");
        assert!(!spans_overlap(day1, 840, 1320, day2, 300, 780));
        // 反向参数同样不重叠 (对称性)
        assert!(!spans_overlap(day2, 300, 780, day1, 840, 1320));
    }

    #[test]
    fn test_spans_overlap_midnight_boundary() {
        // 前日 16:00-24:00 与次日 00:00-08:00 端点相接, 半开区间不算重叠
        let day1 = d("2025-03-03");
        let day2 = d("2025-03-04");
        assert!(!spans_overlap(day1, 960, 1440, day2, 0, 480));
    }

    #[test]
    fn test_spans_overlap_distant_days() {
        let day1 = d("2025-03-03");
        let day3 = d("2025-03-05");
        assert!(!spans_overlap(day1, 0, 1440, day3, 0, 1440));
    }

    // ==========================================
    // 测试 4: 休息间隔 (对称)
    // ==========================================

    #[test]
    fn test_rest_gap_same_day() {
        let day = d("2025-03-03");
        // 08:00-12:00 与 20:00-23:00: 休息 8 小时
        assert_eq!(rest_gap_minutes(day, 480, 720, day, 1200, 1380), Some(480));
        // 参数对调结果一致
        assert_eq!(rest_gap_minutes(day, 1200, 1380, day, 480, 720), Some(480));
    }

    #[test]
    fn test_rest_gap_cross_day() {
        let day1 = d("2025-03-03");
        let day2 = d("2025-03-04");
        // 前日 12:30-20:30 结束, 次日 04:25 开始: (24:00-20:30)+4:25 = 475 分钟
        assert_eq!(rest_gap_minutes(day1, 750, 1230, day2, 265, 745), Some(475));
        assert_eq!(rest_gap_minutes(day2, 265, 745, day1, 750, 1230), Some(475));
    }

    #[test]
    fn test_rest_gap_overlapping_is_negative() {
        let day = d("2025-03-03");
        let gap = rest_gap_minutes(day, 480, 720, day, 600, 900).unwrap();
        assert!(gap < 0);
    }

    #[test]
    fn test_rest_gap_distant_days_none() {
        let day1 = d("2025-03-03");
        let day4 = d("2025-03-06");
        assert_eq!(rest_gap_minutes(day1, 480, 720, day4, 480, 720), None);
    }

    // ==========================================
    // 测试 5: 日期与星期
    // ==========================================

    #[test]
    fn test_expand_date_range() {
        let dates = expand_date_range(d("2025-03-01"), d("2025-03-03"));
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0], d("2025-03-01"));
        assert_eq!(dates[2], d("2025-03-03"));

        // 单日区间
        let one = expand_date_range(d("2025-03-01"), d("2025-03-01"));
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_day_of_week_sunday_zero() {
        assert_eq!(day_of_week(d("2025-03-02")), 0); // 周日
        assert_eq!(day_of_week(d("2025-03-03")), 1); // 周一
        assert_eq!(day_of_week(d("2025-03-08")), 6); // 周六
    }

    #[test]
    fn test_weekend_helpers() {
        assert!(is_weekend(0));
        assert!(is_weekend(6));
        assert!(!is_weekend(3));
        assert!(is_saturday(6));
        assert!(is_sunday(0));
    }

    #[test]
    fn test_weekly_equivalent_hours() {
        // 130 小时月累计 ≈ 30.02 周等效小时
        let weekly = weekly_equivalent_hours(130 * 60);
        assert!((weekly - 130.0 / 4.33).abs() < 1e-9);
    }
}
