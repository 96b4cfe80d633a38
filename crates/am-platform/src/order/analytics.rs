//! Sales analytics shaping
//!
//! The aggregation pipeline only returns months that have orders. The
//! dashboard wants a dense series starting at January, so the rows are
//! padded with zero months and cut off after the last month of interest
//! (the current month for the current year, December otherwise).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun",
    "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One row out of the monthly sales aggregation
#[derive(Debug, Deserialize)]
pub struct MonthlySalesRow {
    /// 1-based month number from `$month`
    #[serde(rename = "_id")]
    pub month: i32,
    pub count: i64,
    pub total: f64,
}

/// One dashboard data point
#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct MonthSales {
    pub name: &'static str,
    pub count: u64,
    /// Revenue rounded to the nearest whole unit
    pub total: u64,
}

/// Shape aggregation rows into a dense Jan..=through_month series.
/// Out-of-range rows are dropped; `through_month` is clamped to 1..=12.
pub fn build_sales_data(rows: &[MonthlySalesRow], through_month: u32) -> Vec<MonthSales> {
    let through = through_month.clamp(1, 12) as usize;
    let mut series: Vec<MonthSales> = (0..through)
        .map(|i| MonthSales {
            name: MONTH_NAMES[i],
            count: 0,
            total: 0,
        })
        .collect();

    for row in rows {
        if row.month < 1 || row.month as usize > through {
            continue;
        }
        let slot = &mut series[(row.month - 1) as usize];
        slot.count = row.count.max(0) as u64;
        slot.total = row.total.max(0.0).round() as u64;
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_missing_months_with_zeros() {
        let rows = vec![
            MonthlySalesRow { month: 2, count: 3, total: 120.0 },
            MonthlySalesRow { month: 5, count: 1, total: 49.6 },
        ];
        let series = build_sales_data(&rows, 6);

        assert_eq!(series.len(), 6);
        assert_eq!(series[0], MonthSales { name: "Jan", count: 0, total: 0 });
        assert_eq!(series[1], MonthSales { name: "Feb", count: 3, total: 120 });
        assert_eq!(series[4], MonthSales { name: "May", count: 1, total: 50 });
        assert_eq!(series[5], MonthSales { name: "Jun", count: 0, total: 0 });
    }

    #[test]
    fn test_truncates_after_through_month() {
        let rows = vec![
            MonthlySalesRow { month: 3, count: 2, total: 10.0 },
            MonthlySalesRow { month: 11, count: 9, total: 900.0 },
        ];
        let series = build_sales_data(&rows, 3);

        assert_eq!(series.len(), 3);
        assert_eq!(series[2].count, 2);
    }

    #[test]
    fn test_full_year() {
        let series = build_sales_data(&[], 12);
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].name, "Jan");
        assert_eq!(series[11].name, "Dec");
        assert!(series.iter().all(|m| m.count == 0 && m.total == 0));
    }

    #[test]
    fn test_revenue_rounds_to_nearest() {
        let rows = vec![
            MonthlySalesRow { month: 1, count: 1, total: 10.4 },
            MonthlySalesRow { month: 2, count: 1, total: 10.5 },
        ];
        let series = build_sales_data(&rows, 2);
        assert_eq!(series[0].total, 10);
        assert_eq!(series[1].total, 11);
    }

    #[test]
    fn test_out_of_range_rows_dropped() {
        let rows = vec![
            MonthlySalesRow { month: 0, count: 5, total: 1.0 },
            MonthlySalesRow { month: 13, count: 5, total: 1.0 },
        ];
        let series = build_sales_data(&rows, 12);
        assert!(series.iter().all(|m| m.count == 0));
    }

    #[test]
    fn test_through_month_is_clamped() {
        assert_eq!(build_sales_data(&[], 0).len(), 1);
        assert_eq!(build_sales_data(&[], 99).len(), 12);
    }
}
