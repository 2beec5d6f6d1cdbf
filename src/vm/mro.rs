//! C3 선형화
//!
//! 타입 생성/`__bases__` 재할당 시 MRO를 계산합니다.
//! 디스패치 경로는 여기서 만든 MRO를 검증 없이 그대로 사용합니다.

use super::type_def::TypeId;

/// `id` 타입의 MRO 계산
///
/// `bases`는 선언 순서대로 `(기반 타입, 그 타입의 MRO)` 쌍입니다.
/// 일관된 순서가 없으면 충돌한 후보 타입들을 `Err`로 돌려줍니다.
pub fn c3_linearize(id: TypeId, bases: &[(TypeId, &[TypeId])]) -> Result<Vec<TypeId>, Vec<TypeId>> {
    let mut sequences: Vec<Vec<TypeId>> = bases.iter().map(|(_, mro)| mro.to_vec()).collect();
    sequences.push(bases.iter().map(|(base, _)| *base).collect());

    let mut result = vec![id];
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Ok(result);
        }

        // 어떤 시퀀스의 꼬리에도 등장하지 않는 첫 번째 머리
        let candidate = sequences
            .iter()
            .map(|seq| seq[0])
            .find(|head| !sequences.iter().any(|seq| seq[1..].contains(head)));

        let Some(next) = candidate else {
            let mut heads: Vec<TypeId> = Vec::new();
            for seq in &sequences {
                if !heads.contains(&seq[0]) {
                    heads.push(seq[0]);
                }
            }
            return Err(heads);
        };

        result.push(next);
        for seq in sequences.iter_mut() {
            if seq[0] == next {
                seq.remove(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const O: TypeId = 0;

    #[test]
    fn test_single_inheritance() {
        let a_mro = [1, O];
        let mro = c3_linearize(2, &[(1, &a_mro[..])]).unwrap();
        assert_eq!(mro, vec![2, 1, O]);
    }

    #[test]
    fn test_diamond() {
        // class A; class B(A); class C(A); class D(B, C)
        let b = [2, 1, O];
        let c = [3, 1, O];
        let mro = c3_linearize(4, &[(2, &b[..]), (3, &c[..])]).unwrap();
        assert_eq!(mro, vec![4, 2, 3, 1, O]);
    }

    #[test]
    fn test_conflict_reports_heads() {
        // class X; class Y; class A(X, Y); class B(Y, X); class C(A, B)
        let a = [3, 1, 2, O];
        let b = [4, 2, 1, O];
        let err = c3_linearize(5, &[(3, &a[..]), (4, &b[..])]).unwrap_err();
        assert_eq!(err, vec![1, 2]);
    }

    #[test]
    fn test_base_listed_before_its_subclass_conflicts() {
        // class A; class B(A); class C(A, B)
        let a = [1, O];
        let b = [2, 1, O];
        assert!(c3_linearize(3, &[(1, &a[..]), (2, &b[..])]).is_err());
    }
}
