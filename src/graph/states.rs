//! Brazilian federative units (26 states plus the Federal District)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FederativeUnit {
    pub sigla: &'static str,
    pub nome: &'static str,
    pub regiao: &'static str,
}

const fn uf(sigla: &'static str, nome: &'static str, regiao: &'static str) -> FederativeUnit {
    FederativeUnit {
        sigla,
        nome,
        regiao,
    }
}

pub static FEDERATIVE_UNITS: [FederativeUnit; 27] = [
    uf("AC", "Acre", "Norte"),
    uf("AL", "Alagoas", "Nordeste"),
    uf("AP", "Amapá", "Norte"),
    uf("AM", "Amazonas", "Norte"),
    uf("BA", "Bahia", "Nordeste"),
    uf("CE", "Ceará", "Nordeste"),
    uf("DF", "Distrito Federal", "Centro-Oeste"),
    uf("ES", "Espírito Santo", "Sudeste"),
    uf("GO", "Goiás", "Centro-Oeste"),
    uf("MA", "Maranhão", "Nordeste"),
    uf("MT", "Mato Grosso", "Centro-Oeste"),
    uf("MS", "Mato Grosso do Sul", "Centro-Oeste"),
    uf("MG", "Minas Gerais", "Sudeste"),
    uf("PA", "Pará", "Norte"),
    uf("PB", "Paraíba", "Nordeste"),
    uf("PR", "Paraná", "Sul"),
    uf("PE", "Pernambuco", "Nordeste"),
    uf("PI", "Piauí", "Nordeste"),
    uf("RJ", "Rio de Janeiro", "Sudeste"),
    uf("RN", "Rio Grande do Norte", "Nordeste"),
    uf("RS", "Rio Grande do Sul", "Sul"),
    uf("RO", "Rondônia", "Norte"),
    uf("RR", "Roraima", "Norte"),
    uf("SC", "Santa Catarina", "Sul"),
    uf("SP", "São Paulo", "Sudeste"),
    uf("SE", "Sergipe", "Nordeste"),
    uf("TO", "Tocantins", "Norte"),
];

pub fn find(sigla: &str) -> Option<&'static FederativeUnit> {
    FEDERATIVE_UNITS.iter().find(|uf| uf.sigla == sigla)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_units_are_unique_and_regions_known() {
        let siglas: BTreeSet<_> = FEDERATIVE_UNITS.iter().map(|uf| uf.sigla).collect();
        assert_eq!(siglas.len(), 27);

        let regions: BTreeSet<_> = FEDERATIVE_UNITS.iter().map(|uf| uf.regiao).collect();
        assert_eq!(
            regions.into_iter().collect::<Vec<_>>(),
            vec!["Centro-Oeste", "Nordeste", "Norte", "Sudeste", "Sul"]
        );
        assert_eq!(find("SP").unwrap().nome, "São Paulo");
        assert!(find("XX").is_none());
    }
}
