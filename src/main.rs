// ==========================================
// Sales Projection - command line entry point
// ==========================================
// Usage: sales-projection [--db <path>] <command> [args...]
// Output: JSON on stdout; failures as an error object on stderr
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use sales_projection::api::{ApiError, ApiResult};
use sales_projection::app::{get_default_db_path, AppState};
use sales_projection::logging;

const USAGE: &str = "\
uso: sales-projection [--db <ruta>] <comando> [argumentos]

comandos:
  init                                  crea la base de datos
  company-add <id> <nombre>             registra una empresa
  company-list                          lista las empresas
  company-delete <id>                   elimina una empresa y sus datos
  import <id_empresa> <archivo>         importa un histórico (.csv, .xlsx, .xls)
  batch-import <id>=<archivo> ...       importa varios archivos en paralelo
  series <id_empresa>                   muestra la serie almacenada
  project <id_empresa> [descripción]    ejecuta una proyección
  runs <id_empresa>                     lista las proyecciones de una empresa
  run-show <id_ejecución>               muestra una proyección
  run-delete <id_ejecución>             elimina una proyección
  config-show                           muestra la configuración
  config-set <clave> <valor>            cambia un valor de configuración";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let db_path = match take_db_flag(&mut args) {
        Ok(path) => path.unwrap_or_else(get_default_db_path),
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };

    let Some(command) = args.first().cloned() else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };
    let rest = &args[1..];

    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(msg) => {
            tracing::error!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    match dispatch(&state, &command, rest).await {
        Ok(Some(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            let response = err.to_response();
            match serde_json::to_string_pretty(&response) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}: {}", response.code, response.message),
            }
            ExitCode::FAILURE
        }
    }
}

/// Remove `--db <path>` from the argument list
fn take_db_flag(args: &mut Vec<String>) -> Result<Option<String>, String> {
    let Some(pos) = args.iter().position(|a| a == "--db") else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        return Err("falta la ruta después de --db".to_string());
    }
    let path = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(path))
}

fn to_json<T: Serialize>(value: &T) -> ApiResult<Option<String>> {
    serde_json::to_string_pretty(value)
        .map(Some)
        .map_err(|e| ApiError::InternalError(format!("no se pudo serializar la salida: {}", e)))
}

fn arg<'a>(rest: &'a [String], idx: usize, name: &str) -> ApiResult<&'a str> {
    rest.get(idx)
        .map(String::as_str)
        .ok_or_else(|| ApiError::InvalidInput(format!("falta el argumento <{}>", name)))
}

fn company_arg(rest: &[String], idx: usize) -> ApiResult<i64> {
    let raw = arg(rest, idx, "id_empresa")?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::InvalidInput(format!("id de empresa inválido: {}", raw)))
}

async fn dispatch(state: &AppState, command: &str, rest: &[String]) -> ApiResult<Option<String>> {
    match command {
        "init" => {
            tracing::info!("base de datos lista: {}", state.db_path);
            to_json(&serde_json::json!({ "dbPath": state.db_path }))
        }
        "company-add" => {
            let company_id = company_arg(rest, 0)?;
            let name = rest.get(1..).map(|parts| parts.join(" ")).unwrap_or_default();
            to_json(&state.history_api.create_company(company_id, &name)?)
        }
        "company-list" => to_json(&state.history_api.list_companies()?),
        "company-delete" => {
            state.history_api.delete_company(company_arg(rest, 0)?)?;
            Ok(None)
        }
        "import" => {
            let company_id = company_arg(rest, 0)?;
            let path = PathBuf::from(arg(rest, 1, "archivo")?);
            to_json(&state.import_api.import_file(company_id, &path).await?)
        }
        "batch-import" => {
            if rest.is_empty() {
                return Err(ApiError::InvalidInput(
                    "indique al menos un par <id>=<archivo>".to_string(),
                ));
            }
            let requests = rest
                .iter()
                .map(|pair| {
                    let (id, path) = pair.split_once('=').ok_or_else(|| {
                        ApiError::InvalidInput(format!("par inválido (se espera <id>=<archivo>): {}", pair))
                    })?;
                    let company_id = id.trim().parse::<i64>().map_err(|_| {
                        ApiError::InvalidInput(format!("id de empresa inválido: {}", id))
                    })?;
                    Ok((company_id, PathBuf::from(path)))
                })
                .collect::<ApiResult<Vec<_>>>()?;
            to_json(&state.import_api.batch_import(requests).await)
        }
        "series" => to_json(&state.history_api.get_series(company_arg(rest, 0)?).await?),
        "project" => {
            let company_id = company_arg(rest, 0)?;
            let description = rest.get(1..).map(|parts| parts.join(" "));
            let response = state
                .projection_api
                .run_projection(company_id, description.as_deref())
                .await?;
            to_json(&response)
        }
        "runs" => to_json(&state.projection_api.list_runs(company_arg(rest, 0)?).await?),
        "run-show" => to_json(&state.projection_api.get_run(arg(rest, 0, "id_ejecución")?).await?),
        "run-delete" => {
            state
                .projection_api
                .delete_run(arg(rest, 0, "id_ejecución")?)
                .await?;
            Ok(None)
        }
        "config-show" => {
            let snapshot = state
                .config
                .get_config_snapshot()
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
            to_json(&snapshot)
        }
        "config-set" => {
            let key = arg(rest, 0, "clave")?;
            let value = arg(rest, 1, "valor")?;
            state
                .config
                .set_config_value(key, value)
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
            Ok(None)
        }
        other => Err(ApiError::InvalidInput(format!(
            "comando desconocido: {}\n\n{}",
            other, USAGE
        ))),
    }
}
