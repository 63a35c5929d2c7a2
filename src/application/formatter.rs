use crate::domain::entities::ResponseReport;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Renders a report as the text shown in the results document
pub fn format_report(report: &ResponseReport) -> String {
    format!(
        "[Query Information]\n\
         \n\
         Requested Time  {}\n\
         Time Taken      {}ms\n\
         Status          {}\n\
         \n\
         [Response]\n\
         \n\
         {}\n",
        report.requested_at.format(TIMESTAMP_FORMAT),
        report.elapsed_ms,
        report.status,
        report.rendered_body,
    )
}
