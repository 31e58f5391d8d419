use axum::extract::{Multipart, State, multipart::MultipartRejection};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::{
        downloads::{BinaryFile, Download},
        forms::{CsvUpload, FormData},
    },
    convert::{
        run_blocking,
        spreadsheet::{self, WorkbookOptions},
    },
    errors::{ErrorBody, Result},
};

/// Convert an uploaded CSV into a styled `.xlsx` workbook
#[utoipa::path(
    post,
    path = "/csv/excel/download",
    tag = "spreadsheets",
    summary = "Convert CSV to Excel",
    description = "Writes every CSV field as a string cell. The first row gets a thin black border and the `colorcode` fill, the other rows get the border only. A non-empty `password` encrypts the workbook so it has to be entered to open it.",
    request_body(content = CsvUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", body = BinaryFile),
        (status = 400, description = "Missing CSV, malformed colorcode or CSV larger than a worksheet", body = ErrorBody),
        (status = 500, description = "CSV could not be parsed or the workbook could not be written", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn csv_to_excel(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Download> {
    let mut form = FormData::read(multipart?).await?;
    let csv = form.take_file("csv")?;
    let password = form.text("password")?;
    let header_fill = spreadsheet::parse_color(&form.text("colorcode")?)?;
    let sheet_name = state.config.spreadsheet.sheet_name.clone();
    debug!(
        bytes = csv.bytes.len(),
        encrypted = !password.is_empty(),
        header_fill = ?header_fill,
        "converting CSV to workbook"
    );

    let xlsx = run_blocking("convert CSV to workbook", move || {
        let options = WorkbookOptions {
            sheet_name: &sheet_name,
            header_fill,
            password: &password,
        };
        spreadsheet::csv_to_xlsx(&csv.bytes, &options)
    })
    .await?;

    Ok(Download::xlsx(xlsx))
}

#[cfg(test)]
mod tests {
    use crate::crypto::CFB_SIGNATURE;
    use crate::errors::ErrorBody;
    use crate::test_utils::TestAssets;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
    use std::io::Cursor;

    fn csv_form(csv: &str) -> MultipartForm {
        MultipartForm::new().add_part("csv", Part::bytes(csv.as_bytes().to_vec()).file_name("data.csv"))
    }

    #[tokio::test]
    async fn test_cells_match_csv_positions() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/csv/excel/download")
            .multipart(csv_form("a,b\nc,d\n").add_text("colorcode", "#FFCC00"))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("content-type"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"output.xlsx\""
        );

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(response.as_bytes().to_vec())).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        let cell = |row, col| range.get_value((row, col)).cloned();
        assert_eq!(cell(0, 0), Some(Data::String("a".to_string())));
        assert_eq!(cell(0, 1), Some(Data::String("b".to_string())));
        assert_eq!(cell(1, 0), Some(Data::String("c".to_string())));
        assert_eq!(cell(1, 1), Some(Data::String("d".to_string())));
    }

    #[tokio::test]
    async fn test_password_encrypts_workbook() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/csv/excel/download")
            .multipart(csv_form("a,b\n").add_text("password", "secret"))
            .await;

        response.assert_status_ok();
        assert!(response.as_bytes().starts_with(&CFB_SIGNATURE));
    }

    #[tokio::test]
    async fn test_missing_csv_is_400() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/csv/excel/download")
            .multipart(MultipartForm::new().add_text("password", ""))
            .await;

        response.assert_status_bad_request();
        let body: ErrorBody = response.json();
        assert_eq!(body.error, "missing form file `csv`");
    }

    #[tokio::test]
    async fn test_malformed_colorcode_is_400() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/csv/excel/download")
            .multipart(csv_form("a\n").add_text("colorcode", "not-a-colour"))
            .await;

        response.assert_status_bad_request();
    }

    #[test_log::test(tokio::test)]
    async fn test_ragged_csv_is_500() {
        let assets = TestAssets::new();
        let response = assets
            .server()
            .post("/csv/excel/download")
            .multipart(csv_form("a,b\nc\n"))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = response.json();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_configured_sheet_name() {
        let assets = TestAssets::new();
        let mut config = assets.config();
        config.spreadsheet.sheet_name = "Export".to_string();
        let response = crate::test_utils::server_with_config(config)
            .post("/csv/excel/download")
            .multipart(csv_form("x,y\n"))
            .await;

        response.assert_status_ok();
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(response.as_bytes().to_vec())).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Export".to_string()]);
    }
}
