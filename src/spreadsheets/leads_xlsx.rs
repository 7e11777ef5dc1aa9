use crate::db::leads::LeadRow;
use crate::errors::ServerError;
use crate::responses::xlsx_response;
use crate::responses::ResultResp;
use chrono::DateTime;
use rust_xlsxwriter::Workbook;

fn format_ts(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub fn export_leads_xlsx(leads: &[LeadRow]) -> ResultResp {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    // Headers
    let headers = [
        "Client",
        "Email",
        "Contact",
        "Deal Type",
        "Status",
        "Property",
        "Notes",
        "Created",
        "Closed",
    ];

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| {
                ServerError::XlsxError(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    // Rows
    for (i, lead) in leads.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet
            .write_string(r, 0, &lead.client.name)
            .map_err(|e| ServerError::XlsxError(format!("Failed to write client: {}", e)))?;

        worksheet
            .write_string(r, 1, &lead.client.email)
            .map_err(|e| ServerError::XlsxError(format!("Failed to write email: {}", e)))?;

        worksheet
            .write_string(r, 2, &lead.client.contact)
            .map_err(|e| ServerError::XlsxError(format!("Failed to write contact: {}", e)))?;

        worksheet
            .write_string(r, 3, lead.deal_type.as_str())
            .map_err(|e| ServerError::XlsxError(format!("Failed to write deal type: {}", e)))?;

        worksheet
            .write_string(r, 4, lead.status.as_str())
            .map_err(|e| ServerError::XlsxError(format!("Failed to write status: {}", e)))?;

        // A dangling weak reference just reads as unavailable.
        let property = lead
            .listing
            .as_ref()
            .map(|l| l.title.as_str())
            .unwrap_or("listing unavailable");
        worksheet
            .write_string(r, 5, property)
            .map_err(|e| ServerError::XlsxError(format!("Failed to write property: {}", e)))?;

        worksheet
            .write_string(r, 6, lead.notes.as_deref().unwrap_or(""))
            .map_err(|e| ServerError::XlsxError(format!("Failed to write notes: {}", e)))?;

        worksheet
            .write_string(r, 7, &format_ts(lead.created_at))
            .map_err(|e| ServerError::XlsxError(format!("Failed to write created: {}", e)))?;

        let closed = lead.closed_at.map(format_ts).unwrap_or_default();
        worksheet
            .write_string(r, 8, &closed)
            .map_err(|e| ServerError::XlsxError(format!("Failed to write closed: {}", e)))?;
    }

    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {}", e)))?;

    xlsx_response(buffer, "leads_report.xlsx")
}
