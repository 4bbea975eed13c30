use serde::Deserialize;

use crate::adapters::{lenient, map_status, non_blank, parse_direction, record_id, text, AdaptContext, AdapterError, Direction};
use crate::models::{CanonicalTransaction, ProviderKind};
use crate::types::{parse_timestamp, Amount, RecordId};

const PROVIDER: ProviderKind = ProviderKind::BankingService;

/// Statement row from the banking-as-a-service rail. Amounts are integer cents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankingServiceRecord {
    #[serde(deserialize_with = "lenient::integer")]
    pub id_transacao: Option<RecordId>,
    /// `credito`, `debito`, or `saldo` for the daily balance pseudo-row.
    pub tipo: Option<String>,
    pub valor: Option<i64>,
    #[serde(deserialize_with = "lenient::integer")]
    pub tarifa: Option<i64>,
    pub tipo_status_transacao: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub codigo_transacao: Option<String>,
    pub end_to_end_id: Option<String>,
    pub id_conciliacao: Option<String>,
    pub descricao: Option<String>,
    pub data_transacao: Option<String>,
    pub data_recebimento: Option<String>,
    pub data_atualizacao: Option<String>,
    pub nome_pagador: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub documento_pagador: Option<String>,
    pub banco_pagador: Option<String>,
    pub nome_recebedor: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub estorno: Option<bool>,
    pub end_to_end_id_original: Option<String>
}

pub(super) fn adapt(record: BankingServiceRecord, context: &AdaptContext, position: usize) -> Result<Option<CanonicalTransaction>, AdapterError> {
    let tipo = record.tipo.as_deref()
        .ok_or_else(|| AdapterError::missing_field(PROVIDER, position, "tipo"))?;

    let transaction_type = match parse_direction(tipo) {
        Some(Direction::Flow(transaction_type)) => transaction_type,
        Some(Direction::Balance) => return Ok(None),
        None => return Err(AdapterError::malformed_field(PROVIDER, position, "tipo", tipo))
    };

    let valor = record.valor
        .ok_or_else(|| AdapterError::missing_field(PROVIDER, position, "valor"))?;

    //NOTE: The sign of `valor` is ignored; direction comes from `tipo` on this rail
    let (amount, _) = Amount::from_minor(valor);
    let local = &context.local_offset;

    let mut transaction = CanonicalTransaction::new(PROVIDER, 0, transaction_type, amount);
    transaction.transaction_id = text(record.codigo_transacao);
    transaction.end_to_end_id = text(record.end_to_end_id);
    transaction.reconciliation_id = non_blank(record.id_conciliacao);
    transaction.status = map_status(record.tipo_status_transacao.as_deref().unwrap_or_default(), context.unknown_status);
    transaction.fee = record.tarifa.map(|fee| Amount::from_minor(fee).0).unwrap_or_default();
    transaction.currency = "BRL".to_string();
    transaction.method = "PIX".to_string();
    transaction.method_name = text(record.descricao);
    transaction.payer_name = text(record.nome_pagador);
    transaction.payer_tax_id = text(record.documento_pagador);
    transaction.payer_bank_name = text(record.banco_pagador);
    transaction.payee_name = text(record.nome_recebedor);
    transaction.created_at = record.data_transacao.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.received_at = record.data_recebimento.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.updated_at = record.data_atualizacao.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.is_reversal = record.estorno.unwrap_or(false);
    transaction.origin_end_to_end_id = non_blank(record.end_to_end_id_original);

    transaction.id = record_id(record.id_transacao, &transaction);

    Ok(Some(transaction))
}
