//! System prompt assembly: persona + phase instructions + phase digest +
//! research digest + a locale bookend that tells the model what language
//! to answer in.
//!
//! Only `en` and `pt_br` carry a fully localized instruction table (see
//! [`Locale::has_full_prompt_sections`]); every other locale gets the
//! English instructions plus a short bookend asking for that locale's
//! responses, rather than a half-translated prompt.

use forge_domain::locale::Locale;
use forge_domain::phase::Phase;
use forge_domain::state::forge_state::ForgeState;

use super::digest::{build_phase_digest, build_research_digest};

const PERSONA_EN: &str = "You are a research partner guiding the user through a structured \
    dialectical reasoning process: decompose a problem to its fundamentals, explore the \
    solution space, synthesize and stress-test claims across rounds, validate them into a \
    cumulative knowledge graph, converge on a buildable design, and crystallize the result \
    into a final specification.";

const PERSONA_PT_BR: &str = "Você é um parceiro de pesquisa guiando o usuário por um processo \
    estruturado de raciocínio dialético: decompor um problema em seus fundamentos, explorar o \
    espaço de soluções, sintetizar e testar afirmações ao longo de rodadas, validá-las em um \
    grafo de conhecimento cumulativo, convergir para um design viável e cristalizar o \
    resultado em uma especificação final.";

fn persona(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr => PERSONA_PT_BR,
        _ => PERSONA_EN,
    }
}

fn phase_instructions(phase: Phase, locale: Locale) -> String {
    if locale == Locale::PtBr {
        return phase_instructions_pt_br(phase);
    }
    match phase {
        Phase::Decompose => "Break the problem into its irreducible fundamentals, research the \
            state of the art, surface at least 3 explicit assumptions and 3 alternative \
            reframings, and have the user select one reframing before moving on."
            .to_string(),
        Phase::Explore => "Build a morphological box of the solution space, search for at least \
            2 cross-domain analogies, and identify contradictions worth holding in tension."
            .to_string(),
        Phase::Synthesize => "State a thesis, search for its antithesis, and record up to 3 \
            claims this round. Every claim needs an antithesis before the round can close."
            .to_string(),
        Phase::Validate => "Attempt to falsify and check the novelty of every claim this round \
            before scoring and adding it to the cumulative knowledge graph."
            .to_string(),
        Phase::Build => "Analyze gaps in the graph and converge on a buildable design. Starting \
            a second round requires consulting negative knowledge and referencing a prior \
            round's claim."
            .to_string(),
        Phase::Crystallize => "Generate the final knowledge document synthesizing every \
            validated claim into a coherent specification."
            .to_string(),
    }
}

fn phase_instructions_pt_br(phase: Phase) -> String {
    match phase {
        Phase::Decompose => "Decomponha o problema em seus fundamentos irredutíveis, pesquise o \
            estado da arte, levante ao menos 3 suposições explícitas e 3 reformulações \
            alternativas, e peça ao usuário que selecione uma reformulação antes de avançar."
            .to_string(),
        Phase::Explore => "Construa uma caixa morfológica do espaço de soluções, busque ao menos \
            2 analogias interdomínios e identifique contradições que valem a pena manter em \
            tensão."
            .to_string(),
        Phase::Synthesize => "Declare uma tese, busque sua antítese e registre até 3 afirmações \
            nesta rodada. Toda afirmação precisa de uma antítese antes que a rodada possa \
            fechar."
            .to_string(),
        Phase::Validate => "Tente falsificar e verificar a originalidade de cada afirmação desta \
            rodada antes de pontuá-la e adicioná-la ao grafo de conhecimento cumulativo."
            .to_string(),
        Phase::Build => "Analise as lacunas no grafo e convirja para um design viável. Iniciar \
            uma segunda rodada exige consultar o conhecimento negativo e referenciar uma \
            afirmação de uma rodada anterior."
            .to_string(),
        Phase::Crystallize => "Gere o documento de conhecimento final sintetizando cada \
            afirmação validada em uma especificação coerente."
            .to_string(),
    }
}

/// A short instruction appended for locales without a full translation
/// table, asking the model to still answer in that language.
fn locale_bookend(locale: Locale) -> Option<String> {
    if locale.has_full_prompt_sections() {
        return None;
    }
    Some(format!(
        "Respond to the user in {} ({}), even though these instructions are in English.",
        locale, locale.as_str()
    ))
}

/// Assemble the full system prompt for a turn: persona, phase instructions,
/// phase digest, research digest, and a locale bookend when needed.
pub fn build_system_prompt(state: &ForgeState) -> String {
    let locale = state.locale;
    let mut sections = vec![
        persona(locale).to_string(),
        format!("Current phase: {} (round {}).", state.current_phase, state.current_round),
        phase_instructions(state.current_phase, locale),
    ];

    let phase_digest = build_phase_digest(state);
    if !phase_digest.is_empty() {
        sections.push(phase_digest);
    }

    let research_digest = build_research_digest(state);
    if !research_digest.is_empty() {
        sections.push(research_digest);
    }

    if let Some(bookend) = locale_bookend(locale) {
        sections.push(bookend);
    }

    sections.join("\n\n")
}
