// ==========================================
// 门店月度排班引擎 - 约束索引
// ==========================================
// 职责: 把周可用/不可用时段与 PTO/请假日期区间
//       预索引为 O(1) 查询结构, 构建后只读
// ==========================================

use crate::domain::employee::{DateRangeBlock, EmployeeAvailability, EmployeeUnavailability};
use crate::engine::timeline::expand_date_range;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

// ==========================================
// ConstraintIndex - 每员工约束查询索引
// ==========================================
#[derive(Debug, Default, Clone)]
pub struct ConstraintIndex {
    /// 员工 → 星期几 → 可用时段列表
    availability: HashMap<String, HashMap<u8, Vec<(i32, i32)>>>,
    /// 员工 → 星期几 → 不可用时段列表
    unavailability: HashMap<String, HashMap<u8, Vec<(i32, i32)>>>,
    /// 员工 → PTO 日期集合
    pto_dates: HashMap<String, HashSet<NaiveDate>>,
    /// 员工 → 已批准请假日期集合
    time_off_dates: HashMap<String, HashSet<NaiveDate>>,
}

impl ConstraintIndex {
    /// 从原始记录行构建索引
    pub fn build(
        availability: &[EmployeeAvailability],
        unavailability: &[EmployeeUnavailability],
        pto_blocks: &[DateRangeBlock],
        time_off_blocks: &[DateRangeBlock],
    ) -> Self {
        let mut index = Self::default();

        for row in availability {
            index
                .availability
                .entry(row.employee_id.clone())
                .or_default()
                .entry(row.day_of_week)
                .or_default()
                .push((row.start_minute, row.end_minute));
        }

        for row in unavailability {
            index
                .unavailability
                .entry(row.employee_id.clone())
                .or_default()
                .entry(row.day_of_week)
                .or_default()
                .push((row.start_minute, row.end_minute));
        }

        for block in pto_blocks {
            let dates = index.pto_dates.entry(block.employee_id.clone()).or_default();
            for d in expand_date_range(block.start_date, block.end_date) {
                dates.insert(d);
            }
        }

        for block in time_off_blocks {
            let dates = index
                .time_off_dates
                .entry(block.employee_id.clone())
                .or_default();
            for d in expand_date_range(block.start_date, block.end_date) {
                dates.insert(d);
            }
        }

        index
    }

    /// 员工某星期几的可用时段
    pub fn availability_windows(&self, employee_id: &str, day_of_week: u8) -> &[(i32, i32)] {
        self.availability
            .get(employee_id)
            .and_then(|by_dow| by_dow.get(&day_of_week))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 员工某星期几的不可用时段
    pub fn unavailability_windows(&self, employee_id: &str, day_of_week: u8) -> &[(i32, i32)] {
        self.unavailability
            .get(employee_id)
            .and_then(|by_dow| by_dow.get(&day_of_week))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 该日期是否在员工 PTO 内
    pub fn is_pto(&self, employee_id: &str, date: NaiveDate) -> bool {
        self.pto_dates
            .get(employee_id)
            .map(|dates| dates.contains(&date))
            .unwrap_or(false)
    }

    /// 该日期是否在员工已批准请假内
    pub fn is_time_off(&self, employee_id: &str, date: NaiveDate) -> bool {
        self.time_off_dates
            .get(employee_id)
            .map(|dates| dates.contains(&date))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avail(eid: &str, dow: u8, start: i32, end: i32) -> EmployeeAvailability {
        EmployeeAvailability {
            availability_id: format!("a-{}-{}", eid, dow),
            employee_id: eid.to_string(),
            day_of_week: dow,
            start_minute: start,
            end_minute: end,
        }
    }

    fn block(eid: &str, start: &str, end: &str) -> DateRangeBlock {
        DateRangeBlock {
            block_id: format!("b-{}", eid),
            employee_id: eid.to_string(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            note: None,
        }
    }

    #[test]
    fn test_availability_lookup() {
        let index = ConstraintIndex::build(
            &[avail("e1", 1, 240, 900), avail("e1", 1, 1000, 1440)],
            &[],
            &[],
            &[],
        );

        let windows = index.availability_windows("e1", 1);
        assert_eq!(windows.len(), 2);
        assert!(windows.contains(&(240, 900)));

        // 未声明的星期几返回空
        assert!(index.availability_windows("e1", 2).is_empty());
        assert!(index.availability_windows("无此人", 1).is_empty());
    }

    #[test]
    fn test_date_block_expansion() {
        let index = ConstraintIndex::build(
            &[],
            &[],
            &[block("e1", "2025-03-10", "2025-03-12")],
            &[block("e2", "2025-03-05", "2025-03-05")],
        );

        assert!(index.is_pto("e1", "2025-03-10".parse().unwrap()));
        assert!(index.is_pto("e1", "2025-03-12".parse().unwrap()));
        assert!(!index.is_pto("e1", "2025-03-13".parse().unwrap()));

        assert!(index.is_time_off("e2", "2025-03-05".parse().unwrap()));
        assert!(!index.is_time_off("e1", "2025-03-10".parse().unwrap()));
    }
}
