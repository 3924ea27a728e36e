// src/resolver.rs

use crate::error::{DowntimeError, DowntimeResult};
use crate::inventory::Inventory;
use crate::types::{
    ElementKind, ElementType, ResourceIdentity, SERVICE_TYPE_DISK, SERVICE_TYPE_FTS,
    SERVICE_TYPE_TAPE,
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{error, warn};

static TAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("T[1-9]").expect("regex válida"));
static DISK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("D[1-9]").expect("regex válida"));

/// Resolve `(element, nome interno, tipo)` para a identidade usada no GOCDB.
///
/// - Site: tenta traduzir; sem tradução o nome segue inalterado.
/// - StorageElement: usa o host do endpoint e infere o tipo de serviço (disco/fita).
/// - FTS: tipo de serviço fixo; falha de tradução só gera aviso.
/// - Demais: passa direto, sem tipo de serviço.
pub fn resolve_identity<I: Inventory + ?Sized>(
    inventory: &I,
    element: ElementKind,
    name: &str,
    element_type: &ElementType,
) -> DowntimeResult<ResourceIdentity> {
    if element == ElementKind::Site {
        // Site fora do GOCDB não é erro: consulta com o nome interno, sem resultados.
        let resolved = inventory
            .goc_site_name(name)
            .unwrap_or_else(|| name.to_string());
        return Ok(ResourceIdentity {
            element,
            name: resolved,
            service_type: None,
        });
    }

    match element_type {
        ElementType::StorageElement => {
            let Some(se) = inventory.storage_element(name) else {
                error!("[RESOLVER] Falha ao instanciar storage element {}", name);
                return Err(DowntimeError::Resolution {
                    name: name.to_string(),
                    reason: "storage element desconhecido".into(),
                });
            };
            let service_type = se.se_type.as_deref().and_then(service_type_for_se);
            match se.host.filter(|h| !h.trim().is_empty()) {
                Some(host) => Ok(ResourceIdentity {
                    element,
                    name: host,
                    service_type: service_type.map(str::to_string),
                }),
                None => Err(DowntimeError::Resolution {
                    name: name.to_string(),
                    reason: format!("nenhum host para {name}"),
                }),
            }
        }
        ElementType::Fts => {
            let resolved = match inventory.goc_fts_name(name) {
                Some(goc_name) => goc_name,
                None => {
                    warn!("[RESOLVER] {} não está entre os endpoints FTS3 configurados", name);
                    name.to_string()
                }
            };
            Ok(ResourceIdentity {
                element,
                name: resolved,
                service_type: Some(SERVICE_TYPE_FTS.to_string()),
            })
        }
        _ => Ok(ResourceIdentity {
            element,
            name: name.to_string(),
            service_type: None,
        }),
    }
}

/// Infere o tipo de serviço a partir da convenção TXDY do SE.
///
/// Fita tem precedência: um SE `T1D1` é consultado como nearline.
pub fn service_type_for_se(se_type: &str) -> Option<&'static str> {
    if TAPE_RE.is_match(se_type) {
        Some(SERVICE_TYPE_TAPE)
    } else if DISK_RE.is_match(se_type) {
        Some(SERVICE_TYPE_DISK)
    } else {
        None
    }
}
