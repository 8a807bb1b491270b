//! Agent prompt set, persisted verbatim as one JSON object.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::store::{SharedStore, StoreError};

pub const PROMPTS_KEY: &str = "rca_prompts";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("prompt file must define non-empty a1, a2 and a3")]
    Incomplete,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    pub a1: String,
    pub a2: String,
    pub a3: String,
}

impl PromptSet {
    /// Accepts a JSON object only when all three prompts are non-empty strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self { a1: field("a1")?, a2: field("a2")?, a3: field("a3")? })
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            a1: DEFAULT_A1.to_string(),
            a2: DEFAULT_A2.to_string(),
            a3: DEFAULT_A3.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct PromptStore {
    store: SharedStore,
}

impl PromptStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Stored prompts, or the defaults when nothing usable is stored.
    pub fn load(&self) -> PromptSet {
        match self.store.get(PROMPTS_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "stored prompts are unreadable; using defaults");
                PromptSet::default()
            }),
            Ok(_) => PromptSet::default(),
            Err(err) => {
                warn!(error = %err, "prompt store unreadable; using defaults");
                PromptSet::default()
            }
        }
    }

    pub fn is_customized(&self) -> bool {
        matches!(self.store.get(PROMPTS_KEY), Ok(Some(raw)) if !raw.is_empty())
    }

    pub fn save(&self, prompts: &PromptSet) -> Result<(), PromptError> {
        self.store.set(PROMPTS_KEY, &serde_json::to_string(prompts)?)?;
        Ok(())
    }

    pub fn reset(&self) -> Result<PromptSet, PromptError> {
        let defaults = PromptSet::default();
        self.save(&defaults)?;
        Ok(defaults)
    }

    /// Drops the stored prompts so the defaults apply again.
    pub fn forget(&self) -> Result<(), StoreError> {
        self.store.remove(PROMPTS_KEY)
    }

    pub fn export(&self) -> Result<String, PromptError> {
        Ok(serde_json::to_string_pretty(&self.load())?)
    }

    pub fn import(&self, text: &str) -> Result<PromptSet, PromptError> {
        let value: Value = serde_json::from_str(text)?;
        let prompts = PromptSet::from_value(&value).ok_or(PromptError::Incomplete)?;
        self.save(&prompts)?;
        Ok(prompts)
    }
}

const DEFAULT_A1: &str = "Você é um assistente de análise de falhas industriais.
Classifique o problema abaixo em uma das categorias:
- Mecânico
- Elétrico
- Operacional
- Instrumentação
- Outro

Forneça uma análise clara e objetiva da falha, identificando a categoria mais provável com base na descrição fornecida.";

const DEFAULT_A2: &str = r#"Gere ATÉ 6 causas. Dê prioridade a itens alinhados à classificação do Agente-1.
Você é o Agente-2 (Causas). Sua missão é propor causas prováveis e objetivas para uma falha industrial,
com base na descrição do evento e no resultado do Agente-1 (classificação/obrigatoriedade).
Responda SEMPRE em JSON válido, em PT-BR, curto e prático.

Regra de saída (obrigatória):
{
  "categoria_inferida": "<mecânico|elétrico|operacional|instrumentação|outro>",
  "causas": [
    {
      "id": "C1",
      "titulo": "até 6 palavras",
      "hipotese": "1 frase objetiva",
      "evidencias": ["sinais/indícios observáveis"],
      "verificacoes": ["testes/medições/inspeções recomendadas"],
      "dados_necessarios": ["que dado faltando confirma/nega a hipótese"],
      "prioridade": "A|B|C",
      "risco": "Baixo|Médio|Alto"
    }
  ],
  "observacoes": "se necessário"
}

Se o texto do Agente-1 não vier em JSON, extraia a categoria do texto livre e siga normalmente.
Não escreva nada fora do JSON."#;

const DEFAULT_A3: &str = r#"Você é o Agente-3 (Investigação). Você recebe a descrição da falha e um JSON com causas prováveis.
Transforme isso em um plano de investigação e aplique os 5 Porquês.
Responda SEMPRE em JSON válido, conciso e acionável, em PT-BR.

Formato obrigatório:
{
  "plano_investigacao": [
    {
      "causa_id": "C1",
      "tarefas": [
        {
          "descricao": "verbo no infinitivo, muito objetiva",
          "tipo": "inspecao|medicao|entrevista|documento",
          "responsavel_sugestao": "cargo/função (ex.: Eng. Manutenção)",
          "prazo_dias": 3,
          "criterio_sucesso": "o que confirma/nega"
        }
      ]
    }
  ],
  "cinco_porques": [
    {
      "causa_id": "C1",
      "porques": ["1: ...", "2: ...", "3: ...", "4: ...", "5: ..."],
      "causa_raiz_hipotese": "1 frase"
    }
  ],
  "avisos": ["dados faltantes, necessidade de parada programada, etc."]
}

Diretrizes:
- Priorize causas com prioridade A e B; para C gere no máx. 1 tarefa.
- 1–3 tarefas por causa, bem curtas.
- Se faltarem dados, sinalize em "avisos" ou em "criterio_sucesso".
Não escreva nada fora do JSON."#;
