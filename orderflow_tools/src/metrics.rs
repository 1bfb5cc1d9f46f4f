use std::sync::Arc;

use anyhow::Result;
use orderflow_engine::{db_types::OrderStatusType, order_objects::OrderMetrics, MetricsApi, SqliteDatabase};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

use crate::MetricsParams;

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

pub fn format_metrics(metrics: &OrderMetrics) -> String {
    let mut table = Table::new();
    table.set_format(markdown_format());
    table.set_titles(row!["Status", "Orders"]);
    for status in OrderStatusType::ALL {
        table.add_row(row![status, r->metrics.status_counts.get(status)]);
    }
    table.add_row(row!["Total", r->metrics.total_orders]);
    let average = match metrics.average_processing_time_seconds {
        Some(secs) => format!("{secs:.3}s"),
        None => "No completed orders".to_string(),
    };
    format!("{table}\nOrders processed: {}\nAverage processing time: {average}\n", metrics.total_orders_processed)
}

pub async fn print_metrics(params: MetricsParams) {
    async fn fetch() -> Result<OrderMetrics> {
        let db = Arc::new(SqliteDatabase::new(1).await?);
        let metrics = MetricsApi::new(Arc::clone(&db)).compute_metrics().await?;
        db.close().await;
        Ok(metrics)
    }

    let metrics = match fetch().await {
        Ok(m) => m,
        Err(e) => {
            println!("Error fetching metrics: {e}");
            return;
        },
    };
    if params.json {
        match serde_json::to_string_pretty(&metrics) {
            Ok(s) => println!("{s}"),
            Err(e) => println!("Error serializing metrics: {e}"),
        }
    } else {
        println!("{}", format_metrics(&metrics));
    }
}
