// ==========================================
// 门店月度排班引擎 - 运行状态
// ==========================================
// 职责: 当前工作排班表 + 各员工累计分钟/按日索引
// 红线: 状态归单次运行独占所有, 只能通过本结构的
//       方法变更, 保证缓存与排班表始终一致
// ==========================================

use crate::domain::AssignedShift;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

// ==========================================
// DayShift - 按日索引中的班次条目
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DayShift {
    pub start_minute: i32, // 开始时刻 (分钟)
    pub end_minute: i32,   // 结束时刻 (分钟)
    pub label: String,     // 班次标签
}

// ==========================================
// ScheduleState - 单次运行独占的可变状态
// ==========================================
#[derive(Debug, Default, Clone)]
pub struct ScheduleState {
    /// 工作排班表 (提交顺序)
    assignments: Vec<AssignedShift>,
    /// 各员工累计已分配分钟数
    minutes_by_employee: HashMap<String, i64>,
    /// 各员工按日期索引的班次 (日期键仅在存在班次时出现)
    by_employee_date: HashMap<String, BTreeMap<NaiveDate, Vec<DayShift>>>,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== 只读访问 =====

    /// 当前排班表
    pub fn assignments(&self) -> &[AssignedShift] {
        &self.assignments
    }

    /// 排班条目数
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// 员工累计已分配分钟数
    pub fn minutes_of(&self, employee_id: &str) -> i64 {
        *self.minutes_by_employee.get(employee_id).unwrap_or(&0)
    }

    /// 员工按日期索引的班次 (无任何班次返回 None)
    pub fn days_of(&self, employee_id: &str) -> Option<&BTreeMap<NaiveDate, Vec<DayShift>>> {
        self.by_employee_date.get(employee_id)
    }

    /// 员工在指定日期的班次
    pub fn shifts_on(&self, employee_id: &str, date: NaiveDate) -> &[DayShift] {
        self.by_employee_date
            .get(employee_id)
            .and_then(|days| days.get(&date))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 统计某班次实例当前已分配人数
    pub fn assigned_count_for_slot(
        &self,
        shift_date: NaiveDate,
        label: &str,
        start_minute: i32,
        end_minute: i32,
    ) -> i64 {
        self.assignments
            .iter()
            .filter(|a| a.matches_slot(shift_date, label, start_minute, end_minute))
            .count() as i64
    }

    /// 员工是否已持有周末班次
    pub fn has_weekend_shift(&self, employee_id: &str) -> bool {
        self.assignments
            .iter()
            .any(|a| a.employee_id == employee_id && a.is_weekend())
    }

    /// 缓存一致性检查: 累计分钟必须等于排班表中该员工班次时长之和
    pub fn totals_consistent(&self) -> bool {
        let mut recomputed: HashMap<&str, i64> = HashMap::new();
        for a in &self.assignments {
            *recomputed.entry(a.employee_id.as_str()).or_insert(0) +=
                a.duration_minutes() as i64;
        }
        // 记录过的员工与重算结果逐一比对 (未记录视作 0)
        for (eid, minutes) in &self.minutes_by_employee {
            if recomputed.get(eid.as_str()).copied().unwrap_or(0) != *minutes {
                return false;
            }
        }
        recomputed
            .iter()
            .all(|(eid, minutes)| self.minutes_of(eid) == *minutes)
    }

    // ===== 状态变更 =====

    /// 提交一条新分配
    pub fn commit(&mut self, shift: AssignedShift) {
        self.add_to_index(&shift);
        *self
            .minutes_by_employee
            .entry(shift.employee_id.clone())
            .or_insert(0) += shift.duration_minutes() as i64;
        self.assignments.push(shift);
    }

    /// 将第 index 条分配改派给另一名员工 (修复/回填用)
    ///
    /// # 规则
    /// 两名员工的累计分钟与按日索引同步更新
    pub fn reassign(&mut self, index: usize, new_employee_id: &str) {
        let duration = self.assignments[index].duration_minutes() as i64;
        let old = self.assignments[index].clone();

        self.remove_from_index(&old);
        *self
            .minutes_by_employee
            .entry(old.employee_id.clone())
            .or_insert(0) -= duration;

        self.assignments[index].employee_id = new_employee_id.to_string();
        let updated = self.assignments[index].clone();
        self.add_to_index(&updated);
        *self
            .minutes_by_employee
            .entry(new_employee_id.to_string())
            .or_insert(0) += duration;
    }

    /// 交换两条分配的员工 (偏好交换/优化器用)
    pub fn swap_employees(&mut self, i: usize, j: usize) {
        let emp_i = self.assignments[i].employee_id.clone();
        let emp_j = self.assignments[j].employee_id.clone();
        self.reassign(i, &emp_j);
        self.reassign(j, &emp_i);
    }

    // ===== 内部索引维护 =====

    fn add_to_index(&mut self, shift: &AssignedShift) {
        self.by_employee_date
            .entry(shift.employee_id.clone())
            .or_default()
            .entry(shift.shift_date)
            .or_default()
            .push(DayShift {
                start_minute: shift.start_minute,
                end_minute: shift.end_minute,
                label: shift.label.clone(),
            });
    }

    fn remove_from_index(&mut self, shift: &AssignedShift) {
        if let Some(days) = self.by_employee_date.get_mut(&shift.employee_id) {
            if let Some(slots) = days.get_mut(&shift.shift_date) {
                if let Some(pos) = slots.iter().position(|s| {
                    s.start_minute == shift.start_minute
                        && s.end_minute == shift.end_minute
                        && s.label == shift.label
                }) {
                    slots.remove(pos);
                }
                // 空日期键必须移除, 否则连续天数/clopen 判定会误计
                if slots.is_empty() {
                    days.remove(&shift.shift_date);
                }
            }
        }
    }
}
